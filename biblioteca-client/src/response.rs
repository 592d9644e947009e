//! HTTP response wrapper.

use crate::models::ApiError;
use crate::{ClientError, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// HTTP response with its body fully read.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Create a response from a reqwest response.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.unwrap_or_default();

        Self {
            status,
            headers,
            body,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the response body as bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| ClientError::Json(e.to_string()))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Consume the response and parse as JSON.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        self.json()
    }

    /// Check for an error response and return it.
    ///
    /// A JSON error document from the API supplies the message and field
    /// errors; any other body is used verbatim.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_client_error() || self.status.is_server_error() {
            let (message, field_errors) = match serde_json::from_slice::<ApiError>(&self.body) {
                Ok(api_error) => (api_error.message, api_error.errors.unwrap_or_default()),
                Err(_) => (self.text().unwrap_or_default(), BTreeMap::new()),
            };
            Err(ClientError::Response {
                status: self.status.as_u16(),
                message,
                field_errors,
            })
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> Response {
        Response {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_error_document_is_parsed() {
        let body = r#"{"timestamp":"2024-05-01T10:00:00","status":400,"error":"Bad Request","message":"Datos inválidos","errors":{"email":"formato inválido"}}"#;
        match response(400, body).error_for_status() {
            Err(ClientError::Response {
                status,
                message,
                field_errors,
            }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Datos inválidos");
                assert_eq!(field_errors["email"], "formato inválido");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_plain_error_body() {
        let err = response(502, "Bad Gateway").error_for_status().unwrap_err();
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.user_message("fallback"), "Bad Gateway");
    }

    #[test]
    fn test_success_passes_through() {
        let ok = response(200, r#"{"id":1}"#).error_for_status().unwrap();
        let value: serde_json::Value = ok.json().unwrap();
        assert_eq!(value["id"], 1);
    }
}
