//! Application-level errors.

use biblioteca_client::ClientError;
use biblioteca_config::ConfigError;
use biblioteca_realtime::RealtimeError;
use thiserror::Error;

/// Errors raised while building or running the application root.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The REST client failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The realtime relay failed.
    #[error(transparent)]
    Realtime(#[from] RealtimeError),
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
