//! Connection settings for the library API.

use std::time::Duration;

/// API root used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Settings for an [`HttpClient`](crate::HttpClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// API root including the `/api` segment; resource paths are joined onto it.
    pub base_url: String,
    /// Whole-request limit unless a request sets its own.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Sent with every request.
    pub default_headers: Vec<(String, String)>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl HttpClientConfig {
    /// Settings for `base_url` with a 30 s request and 10 s connect timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            default_headers: vec![("Accept".to_string(), "application/json".to_string())],
            user_agent: format!("biblioteca-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
