//! Main execution logic for an ingestion run

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use osstrends_core::{ProgressContext, fmt_num, is_shutdown_requested, retry_with_backoff};
use osstrends_store::UserStore;

use crate::config::IngestConfig;
use crate::location::Location;
use crate::pool::IngestPool;
use crate::source::ProfileSource;
use crate::stats::Summary;

/// Search every location, feed the candidates through the worker pool
/// and wait for the queue to drain.
///
/// Submission runs on the calling thread while workers already process
/// earlier candidates. A location whose search keeps failing is skipped
/// and counted; item failures never end the run.
pub fn run(
    source: Arc<dyn ProfileSource>,
    store: Arc<dyn UserStore>,
    locations: &[Location],
    config: &IngestConfig,
    progress: &ProgressContext,
) -> anyhow::Result<Summary> {
    let started = Instant::now();
    log::info!(
        "ingest starting: {} locations, {} workers",
        locations.len(),
        config.effective_workers()
    );

    if config.reset_before_run {
        store.reset_all().context("Failed to reset store")?;
    }

    let pool = IngestPool::start(
        config.effective_workers(),
        Arc::clone(&source),
        Arc::clone(&store),
        config.retry,
        progress.items_bar("users"),
    )?;

    let mut summary = Summary {
        locations: locations.len(),
        ..Default::default()
    };

    for location in locations {
        if is_shutdown_requested() {
            log::warn!("Shutdown requested, skipping remaining locations");
            break;
        }
        let location = Arc::new(location.clone());
        let line = progress.stage_line(&location.normalized_name);
        line.set_message(format!("searching {:?}", location.search_term));
        log::info!("{location}: searching {:?}", location.search_term);

        let label = format!("search {}", location.search_term);
        let candidates = match retry_with_backoff(
            &label,
            &config.retry,
            config.location_search_attempts,
            || source.search_candidates_by_location(&location.search_term),
        ) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::error!("{location}: search failed, skipping: {e}");
                summary.failed_locations += 1;
                line.finish_with_message(format!("search failed: {e}"));
                continue;
            }
        };

        let found = candidates.len() as u64;
        for candidate in candidates {
            if !pool.enqueue(candidate, Arc::clone(&location)) {
                break;
            }
        }
        summary.candidates += found;
        line.finish_with_message(format!("{} candidates queued", fmt_num(found)));
        log::info!("{location}: {} candidates queued", fmt_num(found));
    }

    let drained = pool.await_completion();
    summary.pool = pool.shutdown();
    summary.interrupted = !drained || is_shutdown_requested();

    store.flush().context("Failed to flush store")?;
    summary.elapsed = started.elapsed();
    Ok(summary)
}
