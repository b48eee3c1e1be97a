//! osstrends - Developer language statistics by location
//!
//! Finds GitHub users by profile location, keeps those whose location
//! really matches, and aggregates the languages they write per location.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "osstrends")]
#[command(about = "Developer language statistics by location")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./osstrends.toml or ~/.config/osstrends/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Search all locations and store matching developers
    Ingest(cmd::ingest::IngestArgs),
    /// Show language totals for a location, or all locations
    Stats(cmd::stats::StatsArgs),
    /// List stored developers
    Users(cmd::users::UsersArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(osstrends_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug (progress bars show activity)
    //   non-TTY: info unless --debug (logs are the only progress indicator)
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    osstrends_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Ingest(args) => cmd::ingest::run(args, &config, &progress),
        Command::Stats(args) => cmd::stats::run(args, &config),
        Command::Users(args) => cmd::users::run(args, &config),
        Command::Config => {
            let mut table = cmd::table(&["Setting", "Value"]);

            table.add_row(vec!["API URL", &config.github.api_url]);
            table.add_row(vec![
                "Credentials",
                match config.auth() {
                    osstrends_core::Auth::Anonymous => "not set",
                    osstrends_core::Auth::Basic { .. } => "username + token",
                    osstrends_core::Auth::Bearer(_) => "token",
                },
            ]);
            table.add_row(vec![
                "Page size",
                &config.github_config().effective_per_page().to_string(),
            ]);
            table.add_row(vec!["User agent", &config.http_settings().user_agent]);
            table.add_row(vec![
                "Timeouts",
                &format!(
                    "connect {}s, request {}s",
                    config.http.connect_timeout, config.http.request_timeout
                ),
            ]);
            table.add_row(vec!["Workers", &config.pipeline.workers.to_string()]);
            table.add_row(vec![
                "Locations file",
                &config.pipeline.locations_file.display().to_string(),
            ]);
            table.add_row(vec![
                "Reset before run",
                &config.pipeline.reset_before_run.to_string(),
            ]);
            table.add_row(vec![
                "Retry backoff",
                &format!(
                    "{}ms doubling, max {}s",
                    config.retry.base_delay_ms, config.retry.max_delay_secs
                ),
            ]);
            table.add_row(vec![
                "Rate limit wait",
                &format!("max {}s", config.retry.max_rate_limit_wait_secs),
            ]);
            table.add_row(vec![
                "Search attempts",
                &config.retry.location_search_attempts.to_string(),
            ]);
            table.add_row(vec!["Store", &config.store.path.display().to_string()]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
