//! Typed response bodies
//!
//! Only the fields the pipeline reads are declared; unknown fields are
//! ignored. A missing required field fails the parse at the boundary.

use osstrends_core::Candidate;
use serde::Deserialize;

/// One page of `/search/users`.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<Candidate>,
}

/// Entry of `/users/{login}/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    pub name: String,
}

/// `/repos/{owner}/{repo}`: forks carry `source` (root) and `parent`.
#[derive(Debug, Deserialize)]
pub struct RepoDetail {
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub source: Option<RepoRef>,
}

#[derive(Debug, Deserialize)]
pub struct RepoRef {
    pub full_name: String,
}

impl RepoRef {
    /// Split `owner/name`.
    pub fn owner_and_name(&self) -> Option<(String, String)> {
        let (owner, name) = self.full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some((owner.to_string(), name.to_string()))
    }
}
