//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use osstrends_core::{Auth, HttpSettings, RetryPolicy};
use osstrends_github::GitHubConfig;
use osstrends_github::config::{DEFAULT_API_URL, MAX_PER_PAGE};
use osstrends_pipeline::IngestConfig;
use osstrends_pipeline::config::default_workers;
use serde::Deserialize;

/// Global configuration for osstrends
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub github: GithubSection,
    pub http: HttpSection,
    pub pipeline: PipelineSection,
    pub retry: RetrySection,
    pub store: StoreSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubSection {
    pub api_url: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub username: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub token: Option<String>,
    pub per_page: u32,
    pub user_agent: Option<String>,
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            username: None,
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            per_page: MAX_PER_PAGE,
            user_agent: None,
        }
    }
}

/// Timeouts in seconds
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub connect_timeout: u64,
    pub request_timeout: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            connect_timeout: 30,
            request_timeout: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub workers: usize,
    pub locations_file: PathBuf,
    pub reset_before_run: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            locations_file: PathBuf::from("locations.json"),
            reset_before_run: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub base_delay_ms: u64,
    pub max_delay_secs: u64,
    pub max_rate_limit_wait_secs: u64,
    pub location_search_attempts: u32,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            base_delay_ms: 500,
            max_delay_secs: 60,
            max_rate_limit_wait_secs: 900,
            location_search_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/users.json"),
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./osstrends.toml (current directory)
    /// 2. ~/.config/osstrends/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("osstrends.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "osstrends") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn auth(&self) -> Auth {
        Auth::from_parts(self.github.username.clone(), self.github.token.clone())
    }

    pub fn github_config(&self) -> GitHubConfig {
        GitHubConfig {
            api_url: self.github.api_url.clone(),
            per_page: self.github.per_page,
            auth: self.auth(),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        let mut settings = HttpSettings {
            connect_timeout: Duration::from_secs(self.http.connect_timeout),
            request_timeout: Duration::from_secs(self.http.request_timeout),
            ..Default::default()
        };
        if let Some(ua) = &self.github.user_agent {
            settings.user_agent = ua.clone();
        }
        settings
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_secs(self.retry.max_delay_secs),
            max_rate_limit_wait: Duration::from_secs(self.retry.max_rate_limit_wait_secs),
        }
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            workers: self.pipeline.workers,
            reset_before_run: self.pipeline.reset_before_run,
            retry: self.retry_policy(),
            location_search_attempts: self.retry.location_search_attempts,
        }
    }
}
