//! Per-item failure type

use osstrends_core::Retryable;
use osstrends_github::GithubError;
use osstrends_store::StoreError;

/// Why one attempt at a work item failed. Never fatal to the pipeline.
#[derive(Debug)]
pub enum IngestError {
    Remote(GithubError),
    Store(StoreError),
    /// The attempt panicked; carries the panic message
    Panicked(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(e) => write!(f, "remote: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Panicked(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Remote(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Panicked(_) => None,
        }
    }
}

impl From<GithubError> for IngestError {
    fn from(e: GithubError) -> Self {
        Self::Remote(e)
    }
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl IngestError {
    /// Failure from a caught panic payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panicked(msg)
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_rate_limit())
    }
}

impl Retryable for IngestError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Remote(e) => e.is_retryable(),
            Self::Store(_) | Self::Panicked(_) => true,
        }
    }

    fn retry_not_before(&self) -> Option<u64> {
        match self {
            Self::Remote(e) => e.retry_not_before(),
            Self::Store(_) | Self::Panicked(_) => None,
        }
    }
}
