//! GitHub client configuration

use osstrends_core::Auth;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Largest page size the search and listing endpoints accept.
pub const MAX_PER_PAGE: u32 = 100;

/// Runtime configuration for the GitHub client
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API root; GitHub Enterprise roots such as `https://host/api/v3` work too
    pub api_url: String,
    /// Page size for search and repository listings
    pub per_page: u32,
    pub auth: Auth,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            per_page: MAX_PER_PAGE,
            auth: Auth::Anonymous,
        }
    }
}

impl GitHubConfig {
    /// Page size clamped to what the API accepts.
    pub fn effective_per_page(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GitHubConfig::default();
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.effective_per_page(), 100);
    }

    #[test]
    fn per_page_clamped() {
        let mut config = GitHubConfig {
            per_page: 500,
            ..Default::default()
        };
        assert_eq!(config.effective_per_page(), 100);
        config.per_page = 0;
        assert_eq!(config.effective_per_page(), 1);
    }
}
