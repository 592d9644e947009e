// Environment variable loading

use crate::{ConfigError, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable loader
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Create a loader that looks up `<PREFIX>_<KEY>`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::new(Some(prefix.into()))
    }

    /// Full variable name for a key
    pub fn full_key(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = self.full_key(key);
        env::var(&full_key).map_err(|_| ConfigError::KeyNotFound(full_key))
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Parse a variable, falling back to `default` when it is unset.
    ///
    /// A variable that is set but does not parse is an error rather than a
    /// silent fallback.
    pub fn parse_var_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.load_var(key) {
            Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
                key: self.full_key(key),
                value: raw.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse a millisecond count into a `Duration`
    pub fn millis_or(&self, key: &str, default: Duration) -> Result<Duration> {
        let millis = self.parse_var_or(key, default.as_millis() as u64)?;
        Ok(Duration::from_millis(millis))
    }
}
