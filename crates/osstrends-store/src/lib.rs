//! osstrends-store: document store for ingested developer profiles
//!
//! User documents are JSON objects keyed by login and written with
//! `$set`-and-upsert semantics: a write only touches the fields it names.
//! Per-location aggregates are recomputed from the documents on every
//! query. The whole store is persisted as one JSON snapshot.

pub mod aggregate;
pub mod error;
pub mod record;
pub mod snapshot;
pub mod store;

pub use aggregate::{LanguageRow, LocationAggregate, LocationOverview, location_overview};
pub use error::StoreError;
pub use record::StoredUser;
pub use store::{DocumentStore, UserStore};
