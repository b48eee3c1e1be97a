//! osstrends core - shared infrastructure for the ingestion pipeline
//!
//! Blocking HTTP access for worker threads, retry policy, the retry-aware
//! work queue, logging, progress reporting and the types passed between
//! the remote client, the store and the pipeline.

pub mod http;
pub mod logging;
pub mod model;
pub mod progress;
pub mod retry;
pub mod shutdown;
pub mod work_queue;

// Re-exports for convenience
pub use http::{Auth, HttpClient, HttpError, HttpSettings, RawResponse, SHARED_RUNTIME};
pub use logging::{IndicatifLogger, init_logging};
pub use model::{Candidate, LanguageStats, UserProfile, total_code_size};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use retry::{RetryPolicy, Retryable, now_epoch, retry_with_backoff};
pub use shutdown::{
    install_signal_handlers, is_shutdown_requested, shutdown_flag, sleep_interruptible,
};
pub use work_queue::{QueueCounts, WorkQueue};
