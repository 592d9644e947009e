// Configuration for the Biblioteca admin client
//
// Settings are read once at startup from the process environment (optionally
// seeded from a `.env` file) and fall back to static defaults.

pub mod env;
pub mod error;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};

use std::time::Duration;
use url::Url;

/// Prefix shared by every variable this crate reads.
pub const ENV_PREFIX: &str = "BIBLIOTECA";

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Default realtime endpoint.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080";

/// Process-wide settings for the admin client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the REST API, including the `/api` path.
    pub api_url: String,
    /// WebSocket URL of the server push endpoint.
    pub ws_url: String,
    /// Optional cap on events per batch window (0 = windows are purely timed).
    pub event_batch_size: usize,
    /// Length of a batch window.
    pub event_buffer_time: Duration,
    /// Timeout applied to each wrapped call attempt.
    pub event_timeout: Duration,
    /// Additional attempts after the first failure of a wrapped call.
    pub event_max_retries: u32,
    /// Fixed delay between realtime reconnect attempts.
    pub ws_reconnect_interval: Duration,
    /// Reconnect attempts before the relay gives up.
    pub ws_max_reconnect_attempts: u32,
    /// Timeout for establishing the realtime connection.
    pub ws_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            event_batch_size: 0,
            event_buffer_time: Duration::from_millis(1000),
            event_timeout: Duration::from_millis(5000),
            event_max_retries: 3,
            ws_reconnect_interval: Duration::from_millis(3000),
            ws_max_reconnect_attempts: 5,
            ws_timeout: Duration::from_millis(10_000),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read `BIBLIOTECA_*` variables.
    pub fn from_env() -> Result<Self> {
        load_dotenv(None)?;
        Self::from_loader(&EnvLoader::with_prefix(ENV_PREFIX))
    }

    /// Read every setting through `loader`, using defaults for unset keys.
    pub fn from_loader(loader: &EnvLoader) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            api_url: loader.load_var_or("API_URL", &defaults.api_url),
            ws_url: loader.load_var_or("WS_URL", &defaults.ws_url),
            event_batch_size: loader.parse_var_or("EVENT_BATCH_SIZE", defaults.event_batch_size)?,
            event_buffer_time: loader.millis_or("EVENT_BUFFER_TIME", defaults.event_buffer_time)?,
            event_timeout: loader.millis_or("EVENT_TIMEOUT", defaults.event_timeout)?,
            event_max_retries: loader.parse_var_or("EVENT_MAX_RETRIES", defaults.event_max_retries)?,
            ws_reconnect_interval: loader
                .millis_or("WS_RECONNECT_INTERVAL", defaults.ws_reconnect_interval)?,
            ws_max_reconnect_attempts: loader
                .parse_var_or("WS_MAX_RECONNECT_ATTEMPTS", defaults.ws_max_reconnect_attempts)?,
            ws_timeout: loader.millis_or("WS_TIMEOUT", defaults.ws_timeout)?,
        };

        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Check URL schemes and that windows/timeouts are non-zero.
    pub fn validate(&self) -> Result<()> {
        check_scheme("API_URL", &self.api_url, &["http", "https"])?;
        check_scheme("WS_URL", &self.ws_url, &["ws", "wss"])?;

        if self.event_buffer_time.is_zero() {
            return Err(ConfigError::ValidationError(
                "EVENT_BUFFER_TIME must be greater than zero".to_string(),
            ));
        }
        if self.event_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "EVENT_TIMEOUT must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_scheme(key: &str, value: &str, schemes: &[&str]) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{key} is not a valid URL: {e}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::ValidationError(format!(
            "{key} must use one of {schemes:?}, got {}",
            url.scheme()
        )));
    }
    Ok(())
}

/// Load variables from a `.env` file into the process environment.
///
/// With no path the nearest `.env` is used and a missing file is ignored.
pub fn load_dotenv(path: Option<&str>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}
