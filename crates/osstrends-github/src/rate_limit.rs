//! Rate-limit header inspection and response classification
//!
//! Both headers are read on every response regardless of status; a
//! response is a rate-limit failure only when it is non-success *and*
//! the remaining quota is zero.

use osstrends_core::RawResponse;
use serde::Deserialize;

use crate::error::GithubError;

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Quota state reported by the API on a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub remaining: u64,
    /// Epoch seconds at which the quota refills; 0 when not reported
    pub reset_epoch_seconds: u64,
}

impl RateLimitStatus {
    /// Parse both headers; `None` when the remaining count is absent.
    pub fn from_response(resp: &RawResponse) -> Option<Self> {
        let remaining = parse_u64(resp.header(REMAINING_HEADER))?;
        let reset_epoch_seconds = parse_u64(resp.header(RESET_HEADER)).unwrap_or(0);
        Some(Self {
            remaining,
            reset_epoch_seconds,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

fn parse_u64(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.trim().parse().ok())
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// Human-readable reason: the API's `message` field, else the raw body.
fn failure_message(body: &str) -> String {
    match serde_json::from_str::<ApiMessage>(body) {
        Ok(m) => m.message,
        Err(_) => {
            let body = body.trim();
            if body.is_empty() {
                "empty response body".to_string()
            } else {
                body.chars().take(200).collect()
            }
        }
    }
}

/// `Ok(())` for success statuses, otherwise the typed failure.
pub fn classify(resp: &RawResponse) -> Result<(), GithubError> {
    if resp.is_success() {
        return Ok(());
    }
    if let Some(limit) = RateLimitStatus::from_response(resp) {
        if limit.is_exhausted() {
            return Err(GithubError::RateLimitExceeded {
                reset_epoch_seconds: limit.reset_epoch_seconds,
            });
        }
    }
    Err(GithubError::RemoteFetch {
        status: Some(resp.status),
        message: failure_message(&resp.body),
    })
}
