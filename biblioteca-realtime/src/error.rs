//! Error types for relay operations.

use crate::status::RelayStatus;
use std::time::Duration;
use thiserror::Error;

/// Relay error type.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// Protocol or transport error from the WebSocket layer
    #[error("Protocol error: {0}")]
    Protocol(#[from] tungstenite::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Connection attempt did not finish in time
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// An attempt started by another `connect` call did not open the socket
    #[error("Connection attempt failed; relay is {0}")]
    AttemptFailed(RelayStatus),

    /// The connection attempt was abandoned by `connect` or `disconnect`
    #[error("Connection attempt cancelled")]
    Cancelled,
}

/// Result type for relay operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;
