//! Blocking HTTP GET over a shared async client.
//!
//! Uses async reqwest internally on a small shared tokio runtime, but
//! presents a sync interface so plain worker threads can call it.
//! Non-success responses are returned as data, not errors: callers need
//! the status and headers to classify them.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, USER_AGENT};

/// Connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-request timeout (connect + headers + body)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Error types for transport operations
#[derive(Debug)]
pub enum HttpError {
    /// Request could not be completed, with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// No response within the configured request timeout
    Timeout(String),
    /// Client construction failed
    Build(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::Build(msg) => write!(f, "client build failed: {msg}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create transport error from reqwest error.
    ///
    /// The URL is stripped so credentials embedded in query strings
    /// never reach the logs.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_timeout() {
            return Self::Timeout(e.to_string());
        }
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// Credentials attached to every request.
#[derive(Clone, Default)]
pub enum Auth {
    #[default]
    Anonymous,
    Basic {
        username: String,
        token: String,
    },
    Bearer(String),
}

impl Auth {
    /// Basic when both parts are present, bearer for a lone token.
    pub fn from_parts(username: Option<String>, token: Option<String>) -> Self {
        match (username, token) {
            (Some(username), Some(token)) => Self::Basic { username, token },
            (None, Some(token)) => Self::Bearer(token),
            _ => Self::Anonymous,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Basic { .. } => "basic",
            Self::Bearer(_) => "bearer",
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => write!(f, "Basic({username}, ***)"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

/// Timeouts and identification for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: concat!("osstrends/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Response as seen by the caller: status, headers and the full body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header value as text, if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Blocking GET client with connection pooling and fixed credentials.
pub struct HttpClient {
    inner: reqwest::Client,
    auth: Auth,
    user_agent: String,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings, auth: Auth) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            auth,
            user_agent: settings.user_agent.clone(),
        })
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// HTTP GET → status, headers and body text.
    ///
    /// Blocks the calling thread for the duration of the request.
    pub fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> Result<RawResponse, HttpError> {
        let mut request = self
            .inner
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, accept);
        if !query.is_empty() {
            request = request.query(query);
        }
        request = match &self.auth {
            Auth::Anonymous => request,
            Auth::Basic { username, token } => request.basic_auth(username, Some(token)),
            Auth::Bearer(token) => request.bearer_auth(token),
        };

        SHARED_RUNTIME.handle().block_on(async {
            let response = request.send().await.map_err(HttpError::from_reqwest)?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.text().await.map_err(HttpError::from_reqwest)?;
            Ok(RawResponse {
                status,
                headers,
                body,
            })
        })
    }
}
