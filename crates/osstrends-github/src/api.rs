//! GitHub API client
//!
//! Every request goes through [`GitHubClient::request`], which records the
//! rate-limit headers and turns non-success responses into typed errors,
//! so call sites never look at raw headers themselves.

use std::cell::Cell;
use std::sync::{Mutex, PoisonError};

use osstrends_core::{
    Candidate, HttpClient, HttpError, HttpSettings, LanguageStats, RawResponse, UserProfile,
};
use serde::de::DeserializeOwned;

use crate::config::GitHubConfig;
use crate::error::GithubError;
use crate::link::next_link;
use crate::rate_limit::{RateLimitStatus, classify};
use crate::schema::{RepoDetail, RepoSummary, SearchPage};

/// Media type enabling search on the preview API.
pub const SEARCH_ACCEPT: &str = "application/vnd.github.preview";
/// Media type for every other endpoint.
pub const DEFAULT_ACCEPT: &str = "application/vnd.github+json";

/// The search API never returns more than this many results per query.
const SEARCH_RESULT_LIMIT: u64 = 1_000;

/// Hard stop for runaway pagination (a `next` link pointing at itself).
const MAX_PAGES: usize = 1_000;

/// Blocking GET seam between the client and the network.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> Result<RawResponse, HttpError>;
}

impl Transport for HttpClient {
    fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> Result<RawResponse, HttpError> {
        HttpClient::get(self, url, query, accept)
    }
}

/// Remote search client over any [`Transport`].
pub struct GitHubClient<T: Transport = HttpClient> {
    transport: T,
    api_url: String,
    per_page: u32,
    last_rate_limit: Mutex<Option<RateLimitStatus>>,
}

impl GitHubClient<HttpClient> {
    /// Client over real HTTP.
    pub fn connect(config: &GitHubConfig, settings: &HttpSettings) -> Result<Self, HttpError> {
        let transport = HttpClient::new(settings, config.auth.clone())?;
        log::debug!(
            "GitHub client: {} ({} auth)",
            config.api_url,
            config.auth.kind()
        );
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> GitHubClient<T> {
    pub fn new(transport: T, config: &GitHubConfig) -> Self {
        Self {
            transport,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            per_page: config.effective_per_page(),
            last_rate_limit: Mutex::new(None),
        }
    }

    /// Quota state seen on the most recent response, if it reported one.
    pub fn rate_limit_status(&self) -> Option<RateLimitStatus> {
        *self
            .last_rate_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// All users whose profile location matches `search_term`, in page order.
    pub fn search_candidates_by_location(
        &self,
        search_term: &str,
    ) -> Result<Vec<Candidate>, GithubError> {
        let query = [
            ("q", location_qualifier(search_term)),
            ("per_page", self.per_page.to_string()),
        ];
        let total = Cell::new(0u64);
        let candidates = self.paginate("/search/users", &query, SEARCH_ACCEPT, |page: SearchPage| {
            if page.incomplete_results {
                log::warn!("search for {search_term:?} returned incomplete results");
            }
            total.set(total.get().max(page.total_count));
            page.items
        })?;

        let total = total.get();
        if total > SEARCH_RESULT_LIMIT {
            log::warn!(
                "search {search_term:?}: {total} users match, only the first {SEARCH_RESULT_LIMIT} are reachable"
            );
        } else if (candidates.len() as u64) < total {
            log::warn!(
                "search {search_term:?}: got {} of {total} matching users",
                candidates.len()
            );
        }
        log::debug!("search {search_term:?}: {} candidates", candidates.len());
        Ok(candidates)
    }

    /// Full profile of one user.
    pub fn fetch_full_profile(&self, login: &str) -> Result<UserProfile, GithubError> {
        let resp = self.request(&format!("/users/{login}"), &[], DEFAULT_ACCEPT)?;
        parse_body(&resp, "profile")
    }

    /// Repositories owned by `login`, following pagination.
    pub fn list_repos(&self, login: &str) -> Result<Vec<RepoSummary>, GithubError> {
        let query = [("per_page", self.per_page.to_string())];
        self.paginate(
            &format!("/users/{login}/repos"),
            &query,
            DEFAULT_ACCEPT,
            |repos: Vec<RepoSummary>| repos,
        )
    }

    /// Byte counts per language for one repository.
    pub fn fetch_repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<LanguageStats, GithubError> {
        let resp = self.request(&format!("/repos/{owner}/{repo}/languages"), &[], DEFAULT_ACCEPT)?;
        parse_body(&resp, "languages")
    }

    /// Sum of language byte counts over every repository `login` owns.
    ///
    /// Forks count with their own breakdown; no upstream de-duplication.
    pub fn fetch_language_stats(&self, login: &str) -> Result<LanguageStats, GithubError> {
        let repos = self.list_repos(login)?;
        let mut totals = LanguageStats::new();
        for repo in &repos {
            for (language, bytes) in self.fetch_repo_languages(login, &repo.name)? {
                *totals.entry(language).or_insert(0) += bytes;
            }
        }
        log::debug!(
            "{login}: {} languages across {} repos",
            totals.len(),
            repos.len()
        );
        Ok(totals)
    }

    /// Top-level upstream of a fork, or the repository itself.
    pub fn resolve_repo_source(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<(String, String), GithubError> {
        let resp = self.request(&format!("/repos/{owner}/{repo}"), &[], DEFAULT_ACCEPT)?;
        let detail: RepoDetail = parse_body(&resp, "repository")?;
        if !detail.fork {
            return Ok((owner.to_string(), repo.to_string()));
        }
        let source = detail.source.ok_or_else(|| GithubError::RemoteFetch {
            status: Some(resp.status),
            message: format!("{owner}/{repo} is a fork without a source repository"),
        })?;
        source
            .owner_and_name()
            .ok_or_else(|| GithubError::RemoteFetch {
                status: Some(resp.status),
                message: format!("malformed source full_name {:?}", source.full_name),
            })
    }

    /// Endpoint paths are resolved against the API root; absolute URLs
    /// (pagination links) are used verbatim.
    fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
            endpoint.to_string()
        } else {
            format!("{}{endpoint}", self.api_url)
        }
    }

    /// Single GET with rate-limit bookkeeping and status classification.
    fn request(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> Result<RawResponse, GithubError> {
        let url = self.resolve(endpoint);
        let resp = self.transport.get(&url, query, accept)?;

        if let Some(limit) = RateLimitStatus::from_response(&resp) {
            log::trace!(
                "rate limit: {} remaining, reset at {}",
                limit.remaining,
                limit.reset_epoch_seconds
            );
            *self
                .last_rate_limit
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(limit);
        }

        if let Err(e) = classify(&resp) {
            if e.is_rate_limit() {
                log::warn!("{endpoint}: {e}");
            }
            return Err(e);
        }
        Ok(resp)
    }

    /// Follow `rel="next"` links until exhausted, concatenating pages.
    ///
    /// `query` applies to the first request only; next links already
    /// carry the full query string.
    fn paginate<P, I>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        accept: &str,
        extract: impl Fn(P) -> Vec<I>,
    ) -> Result<Vec<I>, GithubError>
    where
        P: DeserializeOwned,
    {
        let mut resp = self.request(endpoint, query, accept)?;
        let mut items = extract(parse_body(&resp, endpoint)?);
        let mut pages = 1;

        while let Some(next) = resp.header("link").and_then(next_link) {
            if pages >= MAX_PAGES {
                log::warn!("{endpoint}: stopping after {MAX_PAGES} pages");
                break;
            }
            resp = self.request(&next, &[], accept)?;
            items.extend(extract(parse_body(&resp, endpoint)?));
            pages += 1;
        }
        log::trace!("{endpoint}: {} items over {pages} pages", items.len());
        Ok(items)
    }
}

/// `location:` search qualifier; multi-word terms are quoted so the
/// search treats them as one phrase.
fn location_qualifier(search_term: &str) -> String {
    let term = search_term.trim();
    if term.contains(char::is_whitespace) && !term.starts_with('"') {
        format!("location:\"{term}\"")
    } else {
        format!("location:{term}")
    }
}

fn parse_body<P: DeserializeOwned>(resp: &RawResponse, context: &str) -> Result<P, GithubError> {
    serde_json::from_str(&resp.body).map_err(|e| GithubError::parse(context, e))
}
