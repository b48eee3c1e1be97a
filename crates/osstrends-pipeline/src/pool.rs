//! Ingestion worker pool
//!
//! A fixed set of threads drains one shared [`WorkQueue`]. Each attempt
//! ends in exactly one of:
//! - `Accepted` / `Rejected`: the item is marked complete
//! - failure or panic: the item is re-queued (after a backoff or
//!   rate-limit wait) and the failed attempt is counted as complete
//!
//! Items are never dropped; only closing the queue ends a worker.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use anyhow::Context;
use indicatif::ProgressBar;
use osstrends_core::{Candidate, RetryPolicy, WorkQueue, shutdown_flag, sleep_interruptible};
use osstrends_store::UserStore;

use crate::error::IngestError;
use crate::location::Location;
use crate::source::ProfileSource;
use crate::stats::PoolStats;
use crate::worker::{Outcome, WorkItem, process_user};

#[derive(Default)]
struct Counters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    failed_attempts: AtomicU64,
    retried: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            abandoned: 0,
        }
    }
}

/// State shared by every worker thread.
struct Shared {
    queue: WorkQueue<WorkItem>,
    counters: Counters,
    source: Arc<dyn ProfileSource>,
    store: Arc<dyn UserStore>,
    policy: RetryPolicy,
    bar: ProgressBar,
}

impl Shared {
    fn update_bar(&self) {
        let counts = self.queue.counts();
        self.bar.set_length(counts.submitted as u64);
        self.bar.set_position(counts.completed as u64);
    }
}

pub struct IngestPool {
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
}

impl IngestPool {
    /// Launch `num_workers` threads blocked on an empty queue.
    pub fn start(
        num_workers: usize,
        source: Arc<dyn ProfileSource>,
        store: Arc<dyn UserStore>,
        policy: RetryPolicy,
        bar: ProgressBar,
    ) -> anyhow::Result<Self> {
        let shared = Arc::new(Shared {
            queue: WorkQueue::new(),
            counters: Counters::default(),
            source,
            store,
            policy,
            bar,
        });

        let num_workers = num_workers.max(1);
        let mut handles = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name(format!("ingest-{id}"))
                .spawn(move || worker_loop(&shared))
                .context("Failed to spawn ingest worker")?;
            handles.push(handle);
        }
        log::debug!("ingest pool started with {num_workers} workers");
        Ok(Self { shared, handles })
    }

    /// Queue one candidate for `location`. Callable while workers drain.
    ///
    /// Returns false once the pool is shutting down.
    pub fn enqueue(&self, candidate: Candidate, location: Arc<Location>) -> bool {
        let pushed = self.shared.queue.push(WorkItem::new(candidate, location));
        if pushed {
            self.shared.update_bar();
        }
        pushed
    }

    /// Block until the queue is empty and nothing is in flight.
    ///
    /// Returns false if interrupted by a shutdown request.
    pub fn await_completion(&self) -> bool {
        self.shared.queue.wait_idle(shutdown_flag())
    }

    pub fn stats(&self) -> PoolStats {
        self.shared.counters.snapshot()
    }

    /// Close the queue, join every worker and report final counts.
    ///
    /// Items still queued at this point are counted as abandoned.
    pub fn shutdown(self) -> PoolStats {
        self.shared.queue.close();
        for handle in self.handles {
            if handle.join().is_err() {
                log::error!("ingest worker panicked");
            }
        }
        let abandoned = self.shared.queue.remaining();
        if !abandoned.is_empty() {
            log::warn!("{} items left unprocessed", abandoned.len());
        }
        self.shared.bar.finish();
        PoolStats {
            abandoned: abandoned.len() as u64,
            ..self.shared.counters.snapshot()
        }
    }
}

fn worker_loop(shared: &Shared) {
    while let Some(mut item) = shared.queue.next() {
        item.attempt += 1;
        // A panicking attempt counts as failed so its slot is released
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            process_user(
                shared.source.as_ref(),
                shared.store.as_ref(),
                &item.candidate,
                &item.location,
            )
        }))
        .unwrap_or_else(|payload| Err(IngestError::from_panic(payload.as_ref())));

        match result {
            Ok(Outcome::Accepted) => {
                shared.counters.accepted.fetch_add(1, Ordering::Relaxed);
                shared.queue.complete();
            }
            Ok(Outcome::Rejected) => {
                shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
                shared.queue.complete();
            }
            Err(e) => {
                shared.counters.failed_attempts.fetch_add(1, Ordering::Relaxed);
                if item.attempt == 1 {
                    shared.counters.retried.fetch_add(1, Ordering::Relaxed);
                }
                let delay = shared.policy.delay_for(&e, item.attempt);
                if e.is_rate_limit() {
                    log::warn!(
                        "{} @ {}: {e}, waiting {}s before retry",
                        item.candidate.login,
                        item.location,
                        delay.as_secs()
                    );
                } else {
                    log::warn!(
                        "{} @ {}: attempt {} failed: {e}, retrying in {delay:?}",
                        item.candidate.login,
                        item.location,
                        item.attempt
                    );
                }
                // Still in flight while waiting, so the drain barrier holds
                if !delay.is_zero() {
                    sleep_interruptible(shutdown_flag(), delay);
                }
                shared.queue.requeue(item);
            }
        }
        shared.update_bar();
    }
}
