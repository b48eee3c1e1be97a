//! Per-location language aggregates
//!
//! Always computed from the current documents; nothing here is stored.

use std::collections::BTreeMap;

use osstrends_core::LanguageStats;
use serde::Serialize;

use crate::record::StoredUser;

/// Language totals for one normalized location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationAggregate {
    /// Sum of byte counts across users at the location.
    pub language_bytes: BTreeMap<String, u64>,
    /// Number of distinct users with the language in their stats.
    pub developer_counts: BTreeMap<String, u64>,
}

/// One language of an aggregate, for ranked display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRow {
    pub language: String,
    pub bytes: u64,
    pub developers: u64,
}

impl LocationAggregate {
    pub fn from_users<'a>(users: impl IntoIterator<Item = &'a StoredUser>) -> Self {
        let mut agg = Self::default();
        for user in users {
            agg.add(&user.languages);
        }
        agg
    }

    /// Fold one user's stats in. Each user holds a language at most once,
    /// so every entry counts as one developer.
    pub fn add(&mut self, languages: &LanguageStats) {
        for (language, bytes) in languages {
            *self.language_bytes.entry(language.clone()).or_insert(0) += bytes;
            *self.developer_counts.entry(language.clone()).or_insert(0) += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.language_bytes.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.language_bytes.values().sum()
    }

    /// Languages by bytes descending, ties by name.
    pub fn ranked(&self) -> Vec<LanguageRow> {
        let mut rows: Vec<LanguageRow> = self
            .language_bytes
            .iter()
            .map(|(language, &bytes)| LanguageRow {
                language: language.clone(),
                bytes,
                developers: self.developer_counts.get(language).copied().unwrap_or(0),
            })
            .collect();
        rows.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.language.cmp(&b.language)));
        rows
    }
}

/// Users and bytes per normalized location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationOverview {
    pub location: String,
    pub users: u64,
    pub total_bytes: u64,
}

/// Overview of every normalized location present, in name order.
///
/// Users without a normalized location (stats-only documents) are skipped.
pub fn location_overview(users: &[StoredUser]) -> Vec<LocationOverview> {
    let mut by_location: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for user in users {
        if let Some(location) = user.location_normalized.as_deref() {
            let entry = by_location.entry(location).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += user.total_code_size;
        }
    }
    by_location
        .into_iter()
        .map(|(location, (users, total_bytes))| LocationOverview {
            location: location.to_string(),
            users,
            total_bytes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn user(login: &str, location: Option<&str>, langs: &[(&str, u64)]) -> StoredUser {
        let languages: LanguageStats = langs.iter().map(|(l, b)| (l.to_string(), *b)).collect();
        StoredUser {
            login: login.to_string(),
            location: None,
            location_normalized: location.map(str::to_string),
            total_code_size: languages.values().sum(),
            languages,
            attributes: Map::new(),
        }
    }

    #[test]
    fn sums_bytes_and_counts_developers() {
        let users = [
            user("a", Some("A"), &[("Python", 12345), ("Java", 6789)]),
            user("b", Some("A"), &[("Java", 9876), ("C", 5678)]),
        ];
        let agg = LocationAggregate::from_users(&users);
        assert_eq!(agg.language_bytes["Java"], 16665);
        assert_eq!(agg.developer_counts["Java"], 2);
        assert_eq!(agg.developer_counts["C"], 1);
        assert_eq!(agg.total_bytes(), 34688);
    }

    #[test]
    fn ranked_by_bytes_then_name() {
        let users = [user("a", Some("A"), &[("Go", 10), ("C", 10), ("Rust", 99)])];
        let names: Vec<_> = LocationAggregate::from_users(&users)
            .ranked()
            .into_iter()
            .map(|r| r.language)
            .collect();
        assert_eq!(names, vec!["Rust", "C", "Go"]);
    }

    #[test]
    fn empty_location() {
        let agg = LocationAggregate::from_users(&[]);
        assert!(agg.is_empty());
        assert!(agg.ranked().is_empty());
    }

    #[test]
    fn overview_groups_by_location() {
        let users = [
            user("a", Some("Seattle"), &[("Python", 10)]),
            user("b", Some("Berlin"), &[("C", 5)]),
            user("c", Some("Seattle"), &[("Java", 7)]),
            user("d", None, &[("Java", 1000)]),
        ];
        let overview = location_overview(&users);
        assert_eq!(
            overview,
            vec![
                LocationOverview {
                    location: "Berlin".into(),
                    users: 1,
                    total_bytes: 5
                },
                LocationOverview {
                    location: "Seattle".into(),
                    users: 2,
                    total_bytes: 17
                },
            ]
        );
    }
}
