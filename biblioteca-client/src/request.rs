//! Request builder.

use crate::{ClientError, HttpClient, Response, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Header carrying the idempotency key of a non-idempotent write.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Key identifying one logical write operation.
///
/// Generate one per user action and pass the same key to every attempt so
/// the backend can recognise repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Fresh random key.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IdempotencyKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for IdempotencyKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// HTTP request builder.
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    body_error: Option<ClientError>,
    timeout: Option<Duration>,
}

impl<'a> RequestBuilder<'a> {
    /// Create a new request builder.
    pub(crate) fn new(client: &'a HttpClient, method: Method, path: String) -> Self {
        Self {
            client,
            method,
            path,
            headers: HeaderMap::new(),
            body: None,
            body_error: None,
            timeout: None,
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Attach an idempotency key, if any.
    pub fn idempotency_key(self, key: Option<&IdempotencyKey>) -> Self {
        match key {
            Some(key) => self.header(IDEMPOTENCY_KEY_HEADER, key.as_str()),
            None => self,
        }
    }

    /// Set the request body as JSON.
    pub fn json<T: Serialize>(mut self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => {
                self.headers.insert(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.body = Some(bytes);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON body");
                self.body_error = Some(e.into());
            }
        }
        self
    }

    /// Set a custom timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send the request.
    pub async fn send(self) -> Result<Response> {
        if let Some(e) = self.body_error {
            return Err(e);
        }

        let url = self.client.url_for(&self.path)?;
        let mut request = self.client.inner().request(self.method.clone(), url);

        // Add default headers from config
        for (name, value) in &self.client.config().default_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        // Add request-specific headers
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        if let Some(body) = self.body {
            request = request.body(body);
        }

        let timeout = self.timeout.unwrap_or(self.client.config().timeout);
        request = request.timeout(timeout);

        let request = request
            .build()
            .map_err(|e| ClientError::RequestBuild(e.to_string()))?;
        self.client.execute(request, timeout).await
    }

    /// Send, fail on a non-success status, and decode the JSON body.
    pub async fn send_json<T: DeserializeOwned>(self) -> Result<T> {
        self.send().await?.error_for_status()?.into_json()
    }

    /// Send and fail on a non-success status, ignoring the body.
    pub async fn send_empty(self) -> Result<()> {
        self.send().await?.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_keys_are_unique() {
        let a = IdempotencyKey::new();
        let b = IdempotencyKey::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_idempotency_key_header() {
        let client = HttpClient::with_base_url("http://localhost:8080/api").unwrap();
        let key = IdempotencyKey::from("fixed-key".to_string());

        let builder = client.post("/loans").idempotency_key(Some(&key));
        assert_eq!(builder.headers.get(IDEMPOTENCY_KEY_HEADER).unwrap(), "fixed-key");

        let builder = client.post("/loans").idempotency_key(None);
        assert!(builder.headers.get(IDEMPOTENCY_KEY_HEADER).is_none());
    }
}
