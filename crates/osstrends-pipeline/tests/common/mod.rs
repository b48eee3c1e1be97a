//! Test doubles shared by the integration tests
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use osstrends_core::{Candidate, LanguageStats, UserProfile};
use osstrends_github::GithubError;
use osstrends_pipeline::ProfileSource;
use osstrends_store::{DocumentStore, StoreError, StoredUser, UserStore};

pub fn stats(entries: &[(&str, u64)]) -> LanguageStats {
    entries.iter().map(|(l, b)| (l.to_string(), *b)).collect()
}

fn server_error(what: &str) -> GithubError {
    GithubError::RemoteFetch {
        status: Some(502),
        message: format!("scripted failure: {what}"),
    }
}

/// In-process source answering from fixed maps.
#[derive(Default)]
pub struct ScriptedSource {
    searches: HashMap<String, Vec<Candidate>>,
    profiles: HashMap<String, UserProfile>,
    languages: HashMap<String, LanguageStats>,
    /// Logins whose next profile fetch fails
    fail_profile_once: Mutex<HashSet<String>>,
    /// Logins whose next stats fetch fails
    fail_stats_once: Mutex<HashSet<String>>,
    /// Search terms that fail this many more times
    search_failures: Mutex<HashMap<String, usize>>,
    /// Logins whose next profile fetch hits the quota, with its reset epoch
    rate_limit_once: Mutex<HashMap<String, u64>>,
    /// Logins whose next profile fetch panics
    panic_profile_once: Mutex<HashSet<String>>,
    pub profile_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, login: &str, location: Option<&str>, langs: &[(&str, u64)]) -> Self {
        self.profiles
            .insert(login.to_string(), UserProfile::new(login, location));
        self.languages.insert(login.to_string(), stats(langs));
        self
    }

    /// `searched` now answers with the profile of `actual`, as after a rename.
    pub fn renamed(
        mut self,
        searched: &str,
        actual: &str,
        location: Option<&str>,
        langs: &[(&str, u64)],
    ) -> Self {
        self.profiles
            .insert(searched.to_string(), UserProfile::new(actual, location));
        self.languages.insert(actual.to_string(), stats(langs));
        self
    }

    pub fn search(mut self, term: &str, logins: &[&str]) -> Self {
        self.searches.insert(
            term.to_string(),
            logins.iter().map(|l| Candidate::new(*l)).collect(),
        );
        self
    }

    pub fn fail_profile_once(self, login: &str) -> Self {
        self.fail_profile_once
            .lock()
            .unwrap()
            .insert(login.to_string());
        self
    }

    pub fn fail_stats_once(self, login: &str) -> Self {
        self.fail_stats_once
            .lock()
            .unwrap()
            .insert(login.to_string());
        self
    }

    pub fn rate_limit_once(self, login: &str, reset_epoch_seconds: u64) -> Self {
        self.rate_limit_once
            .lock()
            .unwrap()
            .insert(login.to_string(), reset_epoch_seconds);
        self
    }

    pub fn panic_profile_once(self, login: &str) -> Self {
        self.panic_profile_once
            .lock()
            .unwrap()
            .insert(login.to_string());
        self
    }

    pub fn fail_search(self, term: &str, times: usize) -> Self {
        self.search_failures
            .lock()
            .unwrap()
            .insert(term.to_string(), times);
        self
    }
}

impl ProfileSource for ScriptedSource {
    fn search_candidates_by_location(
        &self,
        search_term: &str,
    ) -> Result<Vec<Candidate>, GithubError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(left) = self.search_failures.lock().unwrap().get_mut(search_term) {
            if *left > 0 {
                *left -= 1;
                return Err(server_error(search_term));
            }
        }
        Ok(self.searches.get(search_term).cloned().unwrap_or_default())
    }

    fn fetch_full_profile(&self, login: &str) -> Result<UserProfile, GithubError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_profile_once.lock().unwrap().remove(login) {
            return Err(server_error(login));
        }
        if let Some(reset_epoch_seconds) = self.rate_limit_once.lock().unwrap().remove(login) {
            return Err(GithubError::RateLimitExceeded {
                reset_epoch_seconds,
            });
        }
        if self.panic_profile_once.lock().unwrap().remove(login) {
            panic!("scripted panic fetching {login}");
        }
        self.profiles
            .get(login)
            .cloned()
            .ok_or_else(|| GithubError::RemoteFetch {
                status: Some(404),
                message: "Not Found".into(),
            })
    }

    fn fetch_language_stats(&self, login: &str) -> Result<LanguageStats, GithubError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stats_once.lock().unwrap().remove(login) {
            return Err(server_error(login));
        }
        Ok(self.languages.get(login).cloned().unwrap_or_default())
    }
}

/// Real in-memory store that records every write.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: DocumentStore,
    /// (login, normalized location)
    pub user_upserts: Mutex<Vec<(String, String)>>,
    pub stats_upserts: Mutex<Vec<String>>,
    pub resets: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_upserts(&self) -> Vec<(String, String)> {
        self.user_upserts.lock().unwrap().clone()
    }

    pub fn stats_upserts(&self) -> Vec<String> {
        self.stats_upserts.lock().unwrap().clone()
    }
}

impl UserStore for RecordingStore {
    fn reset_all(&self) -> Result<(), StoreError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.inner.reset_all()
    }

    fn upsert_user(
        &self,
        profile: &UserProfile,
        normalized_location: &str,
    ) -> Result<(), StoreError> {
        self.user_upserts
            .lock()
            .unwrap()
            .push((profile.login.clone(), normalized_location.to_string()));
        self.inner.upsert_user(profile, normalized_location)
    }

    fn upsert_language_stats(&self, login: &str, stats: &LanguageStats) -> Result<(), StoreError> {
        self.stats_upserts.lock().unwrap().push(login.to_string());
        self.inner.upsert_language_stats(login, stats)
    }

    fn query_users(
        &self,
        location: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<StoredUser>, StoreError> {
        self.inner.query_users(location, language)
    }

    fn get_user(&self, login: &str) -> Result<Option<StoredUser>, StoreError> {
        self.inner.get_user(login)
    }
}
