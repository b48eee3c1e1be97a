//! Remote operations the pipeline depends on

use osstrends_core::{Candidate, LanguageStats, UserProfile};
use osstrends_github::{GitHubClient, GithubError, Transport};

/// Where candidates, profiles and language statistics come from.
///
/// Shared by every worker thread.
pub trait ProfileSource: Send + Sync {
    fn search_candidates_by_location(
        &self,
        search_term: &str,
    ) -> Result<Vec<Candidate>, GithubError>;

    fn fetch_full_profile(&self, login: &str) -> Result<UserProfile, GithubError>;

    fn fetch_language_stats(&self, login: &str) -> Result<LanguageStats, GithubError>;
}

impl<T: Transport> ProfileSource for GitHubClient<T> {
    fn search_candidates_by_location(
        &self,
        search_term: &str,
    ) -> Result<Vec<Candidate>, GithubError> {
        GitHubClient::search_candidates_by_location(self, search_term)
    }

    fn fetch_full_profile(&self, login: &str) -> Result<UserProfile, GithubError> {
        GitHubClient::fetch_full_profile(self, login)
    }

    fn fetch_language_stats(&self, login: &str) -> Result<LanguageStats, GithubError> {
        GitHubClient::fetch_language_stats(self, login)
    }
}
