//! HTTP client implementation.

use http::Method;
use reqwest::Request;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{ClientError, HttpClientConfig, RequestBuilder, Response, Result};

/// HTTP client bound to one API base URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: Arc<HttpClientConfig>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        url::Url::parse(&config.base_url)?;

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| ClientError::RequestBuild(e.to_string()))?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Create a client for `base_url` with otherwise default settings.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(HttpClientConfig::new(base_url))
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a GET request builder.
    pub fn get(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::GET, path.into())
    }

    /// Create a POST request builder.
    pub fn post(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::POST, path.into())
    }

    /// Create a PUT request builder.
    pub fn put(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PUT, path.into())
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::DELETE, path.into())
    }

    /// Resolve an API path against the base URL.
    ///
    /// The base path is kept: `users/1` on `http://host/api` is
    /// `http://host/api/users/1`.
    pub fn url_for(&self, path: &str) -> Result<url::Url> {
        let joined = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(url::Url::parse(&joined)?)
    }

    /// Execute a request once.
    pub(crate) async fn execute(&self, request: Request, timeout: Duration) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "Sending request");

        let response = self.inner.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(timeout)
            } else if e.is_connect() {
                ClientError::Connection(e.to_string())
            } else {
                ClientError::Http(e)
            }
        })?;

        let response = Response::from_reqwest(response).await;
        debug!(%method, %url, status = %response.status(), "Received response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_with_config() {
        let config = HttpClientConfig::new("https://library.example.com/api")
            .timeout(Duration::from_secs(60));

        let client = HttpClient::new(config).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(60));
        assert_eq!(client.config().base_url, "https://library.example.com/api");
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = HttpClient::with_base_url("http://localhost:8080/api/").unwrap();
        assert_eq!(
            client.url_for("/loans/3/return").unwrap().as_str(),
            "http://localhost:8080/api/loans/3/return"
        );
        assert_eq!(
            client.url_for("books").unwrap().as_str(),
            "http://localhost:8080/api/books"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            HttpClient::with_base_url("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
