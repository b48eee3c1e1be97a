//! Records passed between the remote client, the store and the pipeline

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Language name → bytes of code written in that language.
pub type LanguageStats = BTreeMap<String, u64>;

/// Sum of all byte counts.
pub fn total_code_size(stats: &LanguageStats) -> u64 {
    stats.values().sum()
}

/// Minimal user reference returned by a location search.
///
/// Search results carry many more fields; only the login is kept,
/// the full profile is fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub login: String,
}

impl Candidate {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

/// Full user profile as returned by the remote API.
///
/// `location` is the free-text field the user typed; everything else
/// is carried through untouched in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl UserProfile {
    pub fn new(login: impl Into<String>, location: Option<&str>) -> Self {
        Self {
            login: login.into(),
            location: location.map(str::to_string),
            attributes: Map::new(),
        }
    }

    /// Raw location text, `None` when absent or blank.
    pub fn raw_location(&self) -> Option<&str> {
        self.location.as_deref().filter(|s| !s.trim().is_empty())
    }
}
