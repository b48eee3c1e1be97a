//! Blocking FIFO work queue shared by a pool of worker threads.
//!
//! Tracks items that have been handed out but not yet finished, so a
//! caller can wait until the queue is drained *and* nothing is in flight.
//! A failed item goes back on the queue via [`WorkQueue::requeue`], which
//! re-queues and releases the in-flight slot under one lock: the pending
//! count never touches zero in between, so waiters cannot wake early.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How often `wait_idle` re-checks the shutdown flag.
const IDLE_POLL: Duration = Duration::from_millis(200);

struct QueueState<T> {
    items: VecDeque<T>,
    in_flight: usize,
    submitted: usize,
    completed: usize,
    closed: bool,
}

/// Counters snapshot for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueCounts {
    /// Items pushed, including re-queued retries
    pub submitted: usize,
    /// Attempts finished, successful or not
    pub completed: usize,
    pub queued: usize,
    pub in_flight: usize,
}

/// Thread-safe FIFO with blocking dequeue and a drain barrier.
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
    idle: Condvar,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                in_flight: 0,
                submitted: 0,
                completed: 0,
                closed: false,
            }),
            available: Condvar::new(),
            idle: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        // Counters stay consistent even if a holder panicked mid-update
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item. Returns false once the queue has been closed.
    pub fn push(&self, item: T) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.items.push_back(item);
        state.submitted += 1;
        drop(state);
        self.available.notify_one();
        true
    }

    /// Block until an item is available and claim it.
    ///
    /// Returns `None` once the queue is closed; that is the only way a
    /// worker loop ends.
    pub fn next(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                state.in_flight += 1;
                return Some(item);
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Mark a claimed item finished.
    pub fn complete(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.completed += 1;
        let drained = state.items.is_empty() && state.in_flight == 0;
        drop(state);
        if drained {
            self.idle.notify_all();
        }
    }

    /// Put a claimed item back at the tail and count the failed attempt.
    ///
    /// Items are kept even after `close`, so nothing is silently lost;
    /// [`WorkQueue::remaining`] reports them.
    pub fn requeue(&self, item: T) {
        let mut state = self.lock();
        state.items.push_back(item);
        state.submitted += 1;
        state.in_flight = state.in_flight.saturating_sub(1);
        state.completed += 1;
        drop(state);
        self.available.notify_one();
    }

    /// Block until the queue is empty and no item is in flight.
    ///
    /// Returns `true` when drained, `false` if the queue was closed or
    /// `shutdown` was raised first.
    pub fn wait_idle(&self, shutdown: &AtomicBool) -> bool {
        let mut state = self.lock();
        loop {
            if state.items.is_empty() && state.in_flight == 0 {
                return true;
            }
            if state.closed || shutdown.load(Ordering::Relaxed) {
                return false;
            }
            state = self
                .idle
                .wait_timeout(state, IDLE_POLL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Stop handing out items and wake every blocked worker and waiter.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
        self.idle.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Items queued plus items in flight.
    pub fn pending(&self) -> usize {
        let state = self.lock();
        state.items.len() + state.in_flight
    }

    pub fn counts(&self) -> QueueCounts {
        let state = self.lock();
        QueueCounts {
            submitted: state.submitted,
            completed: state.completed,
            queued: state.items.len(),
            in_flight: state.in_flight,
        }
    }

    /// Drain items that were never processed (after close).
    pub fn remaining(&self) -> Vec<T> {
        self.lock().items.drain(..).collect()
    }
}
