//! Ingest subcommand - search locations and store matching developers

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use osstrends_core::{SharedProgress, install_signal_handlers};
use osstrends_github::GitHubClient;
use osstrends_pipeline::load_locations;
use osstrends_store::DocumentStore;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Locations file (JSON)
    #[arg(short, long)]
    pub locations: Option<PathBuf>,

    /// Store snapshot path
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Keep existing users instead of clearing the store first
    #[arg(long)]
    pub no_reset: bool,
}

pub fn run(args: IngestArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    install_signal_handlers().context("Failed to install signal handlers")?;

    let locations_path = args
        .locations
        .unwrap_or_else(|| config.pipeline.locations_file.clone());
    let locations = load_locations(&locations_path)?;
    if locations.is_empty() {
        log::warn!("{}: no included locations", locations_path.display());
    }

    let mut ingest = config.ingest_config();
    if let Some(workers) = args.workers {
        ingest.workers = workers;
    }
    if args.no_reset {
        ingest.reset_before_run = false;
    }

    let store_path = super::store_path(args.store, config);
    let store = Arc::new(
        DocumentStore::open(&store_path)
            .with_context(|| format!("Failed to open store {}", store_path.display()))?,
    );

    let github = config.github_config();
    if matches!(github.auth, osstrends_core::Auth::Anonymous) {
        log::warn!("No GitHub credentials configured; anonymous rate limits apply");
    }
    let client = Arc::new(
        GitHubClient::connect(&github, &config.http_settings())
            .context("Failed to build GitHub client")?,
    );

    let summary = osstrends_pipeline::run(
        client.clone(),
        store,
        &locations,
        &ingest,
        progress,
    )?;

    if progress.is_tty() {
        summary.print();
    } else {
        summary.log();
    }
    if let Some(limit) = client.rate_limit_status() {
        log::info!("rate limit: {} requests remaining", limit.remaining);
    }
    if summary.interrupted {
        std::process::exit(130);
    }
    Ok(())
}
