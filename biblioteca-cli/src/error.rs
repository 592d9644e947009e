//! Error types for the Biblioteca CLI.

use biblioteca::AppError;
use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded
    Config(String),

    /// An API call failed; holds the message shown to the user
    Api(String),

    /// Realtime connection error
    Realtime(String),

    /// Invalid argument
    InvalidArgument(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Api(msg) => write!(f, "{}", msg),
            CliError::Realtime(msg) => write!(f, "Realtime error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Config(e) => CliError::Config(e.to_string()),
            AppError::Client(e) => CliError::Api(e.to_string()),
            AppError::Realtime(e) => CliError::Realtime(e.to_string()),
        }
    }
}
