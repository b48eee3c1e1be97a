//! osstrends-pipeline: location-driven ingestion of developer profiles
//!
//! For every target location the remote search yields candidates; a pool
//! of worker threads fetches each full profile, keeps it only if the
//! location matcher accepts it, then stores the profile and its language
//! statistics. Failed items are re-queued until they succeed.

pub mod config;
pub mod error;
pub mod location;
pub mod pool;
pub mod runner;
pub mod source;
pub mod stats;
pub mod worker;

pub use config::IngestConfig;
pub use error::IngestError;
pub use location::{Location, load_locations, parse_locations};
pub use pool::IngestPool;
pub use runner::run;
pub use source::ProfileSource;
pub use stats::{PoolStats, Summary};
pub use worker::{Outcome, WorkItem, process_user};
