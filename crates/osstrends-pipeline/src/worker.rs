//! Processing of a single work item

use std::sync::Arc;

use osstrends_core::Candidate;
use osstrends_store::UserStore;

use crate::error::IngestError;
use crate::location::Location;
use crate::source::ProfileSource;

/// Unit of work and of retry: one candidate searched under one location.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub candidate: Candidate,
    pub location: Arc<Location>,
    /// Attempts started so far
    pub attempt: u32,
}

impl WorkItem {
    pub fn new(candidate: Candidate, location: Arc<Location>) -> Self {
        Self {
            candidate,
            location,
            attempt: 0,
        }
    }
}

/// Terminal result of a successful attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Profile and language statistics stored
    Accepted,
    /// Raw location did not match; nothing stored
    Rejected,
}

/// Fetch the full profile, filter on location, persist if accepted.
///
/// A rejected candidate causes no store writes. An accepted one gets
/// exactly one profile upsert followed by one language-stats upsert,
/// both keyed by the login the profile reports. That login can differ
/// from the searched one after a rename or in letter case.
pub fn process_user(
    source: &dyn ProfileSource,
    store: &dyn UserStore,
    candidate: &Candidate,
    location: &Location,
) -> Result<Outcome, IngestError> {
    let profile = source.fetch_full_profile(&candidate.login)?;
    let login = profile.login.as_str();
    if login != candidate.login {
        log::debug!("{}: profile reports login {login}", candidate.login);
    }

    if !location.matches(profile.raw_location()) {
        log::info!(
            "{login}: location {:?} rejected for {location}",
            profile.raw_location().unwrap_or_default()
        );
        return Ok(Outcome::Rejected);
    }

    store.upsert_user(&profile, &location.normalized_name)?;
    log::debug!("{login}: stored under {location}");

    let stats = source.fetch_language_stats(login)?;
    store.upsert_language_stats(login, &stats)?;
    log::debug!("{login}: {} languages stored", stats.len());

    Ok(Outcome::Accepted)
}
