//! Ingestion run configuration

use osstrends_core::RetryPolicy;

/// Default number of workers: available CPUs, at most 8.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(8)
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Worker threads draining the queue
    pub workers: usize,
    /// Clear the store before searching
    pub reset_before_run: bool,
    /// Delay schedule for failed items and searches
    pub retry: RetryPolicy,
    /// Attempts per location search before the location is skipped
    pub location_search_attempts: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            reset_before_run: true,
            retry: RetryPolicy::default(),
            location_search_attempts: 5,
        }
    }
}

impl IngestConfig {
    /// At least one worker.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}
