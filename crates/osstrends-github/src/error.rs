//! Error type for remote API calls

use osstrends_core::{HttpError, Retryable};

/// Failure of a single remote call.
#[derive(Debug)]
pub enum GithubError {
    /// Quota exhausted; retrying before the reset epoch is pointless.
    RateLimitExceeded { reset_epoch_seconds: u64 },
    /// Any other non-success response or transport failure.
    RemoteFetch {
        status: Option<u16>,
        message: String,
    },
    /// Response body did not match the expected shape.
    Parse {
        context: String,
        source: serde_json::Error,
    },
}

impl std::fmt::Display for GithubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimitExceeded {
                reset_epoch_seconds,
            } => {
                let reset = i64::try_from(*reset_epoch_seconds)
                    .ok()
                    .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));
                match reset {
                    Some(at) => write!(f, "rate limit exceeded, resets at {}", at.to_rfc3339()),
                    None => write!(f, "rate limit exceeded, resets at epoch {reset_epoch_seconds}"),
                }
            }
            Self::RemoteFetch {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::RemoteFetch {
                status: None,
                message,
            } => write!(f, "request failed: {message}"),
            Self::Parse { context, source } => write!(f, "invalid {context} JSON: {source}"),
        }
    }
}

impl std::error::Error for GithubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<HttpError> for GithubError {
    fn from(e: HttpError) -> Self {
        let status = match &e {
            HttpError::Http { status, .. } => *status,
            _ => None,
        };
        Self::RemoteFetch {
            status,
            message: e.to_string(),
        }
    }
}

impl GithubError {
    pub fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }
}

impl Retryable for GithubError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimitExceeded { .. } => true,
            // 404/410/422: the resource is gone or the query is invalid
            Self::RemoteFetch { status, .. } => !matches!(status, Some(404 | 410 | 422)),
            Self::Parse { .. } => false,
        }
    }

    fn retry_not_before(&self) -> Option<u64> {
        match self {
            Self::RateLimitExceeded {
                reset_epoch_seconds,
            } => Some(*reset_epoch_seconds),
            _ => None,
        }
    }
}
