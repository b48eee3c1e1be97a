mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use common::{RecordingStore, ScriptedSource};
use indicatif::ProgressBar;
use osstrends_core::{Candidate, RetryPolicy, now_epoch};
use osstrends_pipeline::{IngestPool, Location};
use osstrends_store::UserStore;

fn victoria() -> Arc<Location> {
    Arc::new(Location::new("Victoria", "victoria", ["Australia"]))
}

fn start(
    workers: usize,
    source: &Arc<ScriptedSource>,
    store: &Arc<RecordingStore>,
) -> IngestPool {
    IngestPool::start(
        workers,
        source.clone(),
        store.clone(),
        RetryPolicy::immediate(),
        ProgressBar::hidden(),
    )
    .unwrap()
}

#[test]
fn every_item_failing_once_still_completes() {
    const N: usize = 50;
    let mut source = ScriptedSource::new();
    for i in 0..N {
        let login = format!("user{i}");
        let location = if i % 5 == 0 { "Victoria, Australia" } else { "Victoria, BC" };
        source = source
            .user(&login, Some(location), &[("Rust", i as u64 + 1)])
            .fail_profile_once(&login);
    }
    let source = Arc::new(source);
    let store = Arc::new(RecordingStore::new());
    let pool = start(4, &source, &store);

    let location = victoria();
    for i in 0..N {
        assert!(pool.enqueue(Candidate::new(format!("user{i}")), location.clone()));
    }
    assert!(pool.await_completion());
    let stats = pool.shutdown();

    assert_eq!(stats.accepted, 40);
    assert_eq!(stats.rejected, 10);
    assert_eq!(stats.failed_attempts, N as u64);
    assert_eq!(stats.retried, N as u64);
    assert_eq!(stats.abandoned, 0);
    assert_eq!(source.profile_calls.load(Ordering::SeqCst), 2 * N);
    assert_eq!(store.user_upserts().len(), 40);
    assert_eq!(store.stats_upserts().len(), 40);
    assert_eq!(store.query_users(Some("Victoria"), None).unwrap().len(), 40);
}

#[test]
fn stats_failure_retries_whole_item() {
    let source = Arc::new(
        ScriptedSource::new()
            .user("drusk", Some("Victoria, BC"), &[("Python", 5)])
            .fail_stats_once("drusk"),
    );
    let store = Arc::new(RecordingStore::new());
    let pool = start(2, &source, &store);

    pool.enqueue(Candidate::new("drusk"), victoria());
    assert!(pool.await_completion());
    let stats = pool.shutdown();

    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.failed_attempts, 1);
    // Profile written on both attempts, stats only on the second
    assert_eq!(store.user_upserts().len(), 2);
    assert_eq!(store.stats_upserts().len(), 1);
    assert_eq!(store.get_user("drusk").unwrap().unwrap().total_code_size, 5);
}

#[test]
fn enqueue_while_draining() {
    let mut source = ScriptedSource::new();
    for i in 0..20 {
        source = source.user(&format!("u{i}"), Some("Victoria"), &[("C", 1)]);
    }
    let source = Arc::new(source);
    let store = Arc::new(RecordingStore::new());
    let pool = start(3, &source, &store);
    let location = victoria();

    for i in 0..10 {
        pool.enqueue(Candidate::new(format!("u{i}")), location.clone());
    }
    std::thread::sleep(Duration::from_millis(20));
    for i in 10..20 {
        pool.enqueue(Candidate::new(format!("u{i}")), location.clone());
    }
    assert!(pool.await_completion());
    assert_eq!(pool.stats().accepted, 20);
    pool.shutdown();
}

#[test]
fn empty_pool_completes_immediately() {
    let source = Arc::new(ScriptedSource::new());
    let store = Arc::new(RecordingStore::new());
    let pool = start(2, &source, &store);
    assert!(pool.await_completion());
    assert_eq!(pool.shutdown(), Default::default());
}

#[test]
fn shutdown_reports_unprocessed_items() {
    let source = Arc::new(ScriptedSource::new());
    let store = Arc::new(RecordingStore::new());
    // Unknown logins keep failing with 404, so items cycle until close
    let pool = start(1, &source, &store);
    pool.enqueue(Candidate::new("ghost-a"), victoria());
    pool.enqueue(Candidate::new("ghost-b"), victoria());
    std::thread::sleep(Duration::from_millis(20));

    let stats = pool.shutdown();
    assert!(stats.failed_attempts > 0);
    assert_eq!(stats.accepted, 0);
    assert!((1..=2).contains(&stats.abandoned));
    assert!(store.user_upserts().is_empty());
}

#[test]
fn single_worker_single_item() {
    let source = Arc::new(ScriptedSource::new().user("a", Some("Victoria"), &[]));
    let store = Arc::new(RecordingStore::new());
    let pool = start(1, &source, &store);
    pool.enqueue(Candidate::new("a"), victoria());
    assert!(pool.await_completion());
    let stats = pool.shutdown();
    assert_eq!(stats.accepted, 1);
}

#[test]
fn rate_limited_item_waits_for_reset_in_flight() {
    let source = Arc::new(
        ScriptedSource::new()
            .user("drusk", Some("Victoria, BC"), &[("Python", 273059)])
            .rate_limit_once("drusk", now_epoch() + 1),
    );
    let store = Arc::new(RecordingStore::new());
    let policy = RetryPolicy {
        max_rate_limit_wait: Duration::from_secs(5),
        ..RetryPolicy::immediate()
    };
    let pool = IngestPool::start(
        2,
        source.clone(),
        store.clone(),
        policy,
        ProgressBar::hidden(),
    )
    .unwrap();

    let started = Instant::now();
    pool.enqueue(Candidate::new("drusk"), victoria());
    std::thread::sleep(Duration::from_millis(300));
    // Waiting out the quota: attempt failed, nothing stored, not retried yet
    assert_eq!(pool.stats().failed_attempts, 1);
    assert_eq!(pool.stats().accepted, 0);
    assert_eq!(source.profile_calls.load(Ordering::SeqCst), 1);

    assert!(pool.await_completion());
    let waited = started.elapsed();
    let stats = pool.shutdown();

    // Reset is 1-2 s away plus one second of slack
    assert!(waited >= Duration::from_secs(1), "waited {waited:?}");
    assert!(waited < Duration::from_secs(5), "waited {waited:?}");
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.failed_attempts, 1);
    assert_eq!(source.profile_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        store.get_user("drusk").unwrap().unwrap().total_code_size,
        273059
    );
}

#[test]
fn panicking_attempt_is_retried() {
    let source = Arc::new(
        ScriptedSource::new()
            .user("drusk", Some("Victoria, BC"), &[("C", 3)])
            .user("rrusk", Some("Victoria, BC"), &[("C", 4)])
            .panic_profile_once("drusk"),
    );
    let store = Arc::new(RecordingStore::new());
    let pool = start(2, &source, &store);

    pool.enqueue(Candidate::new("drusk"), victoria());
    pool.enqueue(Candidate::new("rrusk"), victoria());
    assert!(pool.await_completion());
    let stats = pool.shutdown();

    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.failed_attempts, 1);
    assert_eq!(stats.abandoned, 0);
    assert_eq!(store.get_user("drusk").unwrap().unwrap().total_code_size, 3);
}
