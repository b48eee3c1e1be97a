//! Target locations and the location matcher

use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// A target geography. Immutable after load and shared by all workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Name stored on accepted users as `location_normalized`
    pub normalized_name: String,
    /// Term passed to the remote `location:` search
    pub search_term: String,
    /// Lowercased substrings that disqualify a raw location
    stopwords: Vec<String>,
}

impl Location {
    pub fn new(
        normalized_name: impl Into<String>,
        search_term: impl Into<String>,
        stopwords: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        Self {
            normalized_name: normalized_name.into(),
            search_term: search_term.into(),
            stopwords: stopwords
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn stopwords(&self) -> &[String] {
        &self.stopwords
    }

    /// Whether a user's free-text location belongs to this location.
    ///
    /// Absent or blank text never matches. Otherwise the text matches
    /// unless it contains a stopword, compared case-insensitively.
    pub fn matches(&self, raw_location: Option<&str>) -> bool {
        let Some(raw) = raw_location.map(str::trim).filter(|s| !s.is_empty()) else {
            return false;
        };
        let raw = raw.to_lowercase();
        !self.stopwords.iter().any(|stop| raw.contains(stop.as_str()))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized_name)
    }
}

/// Entry of the locations file.
#[derive(Debug, Deserialize)]
struct LocationDef {
    #[serde(alias = "normalized_name")]
    normalized: String,
    search_term: String,
    #[serde(default)]
    stopwords: Vec<String>,
    include: bool,
}

/// Parse a JSON list of location definitions, keeping `include: true`
/// entries in file order.
pub fn parse_locations(json: &str) -> anyhow::Result<Vec<Location>> {
    let defs: Vec<LocationDef> =
        serde_json::from_str(json).context("invalid location definitions")?;
    let total = defs.len();
    let locations: Vec<Location> = defs
        .into_iter()
        .filter(|d| d.include)
        .map(|d| Location::new(d.normalized, d.search_term, d.stopwords))
        .collect();
    log::debug!("{} of {total} locations included", locations.len());
    Ok(locations)
}

pub fn load_locations(path: &Path) -> anyhow::Result<Vec<Location>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_locations(&json).with_context(|| format!("in {}", path.display()))
}
