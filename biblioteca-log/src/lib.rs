//! Biblioteca Logging
//!
//! Installs a `tracing` subscriber configured from the environment. Every
//! other crate in the workspace logs through the `tracing` macros; this crate
//! only decides where those records go and how they look.
//!
//! # Usage
//!
//! ```rust
//! biblioteca_log::init();
//! tracing::info!(port = 8080, "admin client started");
//! ```
//!
//! # Environment Variables
//!
//! - `BIBLIOTECA_DEBUG=1` - Enable debug logging
//! - `BIBLIOTECA_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `BIBLIOTECA_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `BIBLIOTECA_LOG_COLOR=1|0` - Enable/disable colors
//! - `BIBLIOTECA_LOG_MODULE=1|0` - Include the module path of each record
//! - `RUST_LOG` - Full `EnvFilter` directive, overrides the level

use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level of records that are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
    /// Off (no logging)
    Off,
}

impl Level {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Directive understood by `EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_directive().to_uppercase())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human readable output
    Pretty,
    /// Single-line output (default)
    Compact,
    /// One JSON object per line
    Json,
}

impl Format {
    /// Parse a format name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
    /// Whether to include the module path
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Compact,
            color: false,
            module_path: true,
        }
    }
}

impl LogConfig {
    /// Build the configuration from `BIBLIOTECA_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let debug = lookup("BIBLIOTECA_DEBUG").is_some_and(|v| is_truthy(&v));

        let level = lookup("BIBLIOTECA_LOG_LEVEL")
            .and_then(|s| Level::parse(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup("BIBLIOTECA_LOG_FORMAT")
            .and_then(|s| Format::parse(&s))
            .unwrap_or(Format::Compact);

        let color = lookup("BIBLIOTECA_LOG_COLOR")
            .map(|v| is_truthy(&v))
            .unwrap_or_else(|| lookup("NO_COLOR").is_none() && lookup("TERM").is_some());

        let module_path = lookup("BIBLIOTECA_LOG_MODULE")
            .map(|v| is_truthy(&v))
            .unwrap_or(true);

        Self {
            debug,
            level,
            format,
            color,
            module_path,
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_directive()))
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

// ============================================================================
// Public API
// ============================================================================

/// Install the global subscriber using configuration from the environment.
///
/// Returns `false` when a global subscriber was already installed, which is
/// the normal case in test binaries that call this more than once.
pub fn init() -> bool {
    init_with(&LogConfig::from_env())
}

/// Install the global subscriber with an explicit configuration.
pub fn init_with(config: &LogConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.filter());

    let result = match config.format {
        Format::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(config.color)
                    .with_target(config.module_path),
            )
            .try_init(),
        #[cfg(feature = "json")]
        Format::Json => registry
            .with(fmt::layer().json().with_target(config.module_path))
            .try_init(),
        #[cfg(not(feature = "json"))]
        Format::Json => registry
            .with(fmt::layer().compact().with_ansi(false).with_target(config.module_path))
            .try_init(),
        Format::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(config.color)
                    .with_target(config.module_path),
            )
            .try_init(),
    };

    result.is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Off);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("debug"), Some(Level::Debug));
        assert_eq!(Level::parse("DEBUG"), Some(Level::Debug));
        assert_eq!(Level::parse("warning"), Some(Level::Warn));
        assert_eq!(Level::parse("none"), Some(Level::Off));
        assert_eq!(Level::parse("loud"), None);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(Format::parse("pretty"), Some(Format::Pretty));
        assert_eq!(Format::parse("Compact"), Some(Format::Compact));
        assert_eq!(Format::parse("json"), Some(Format::Json));
        assert_eq!(Format::parse("xml"), None);
    }

    #[test]
    fn test_defaults_without_env() {
        let config = LogConfig::from_lookup(lookup_from(&[]));
        assert!(!config.debug);
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.format, Format::Compact);
        assert!(!config.color);
        assert!(config.module_path);
    }

    #[test]
    fn test_debug_flag_lowers_level() {
        let config = LogConfig::from_lookup(lookup_from(&[("BIBLIOTECA_DEBUG", "true")]));
        assert!(config.debug);
        assert_eq!(config.level, Level::Debug);
    }

    #[test]
    fn test_explicit_level_wins_over_debug() {
        let config = LogConfig::from_lookup(lookup_from(&[
            ("BIBLIOTECA_DEBUG", "1"),
            ("BIBLIOTECA_LOG_LEVEL", "error"),
            ("BIBLIOTECA_LOG_FORMAT", "json"),
        ]));
        assert_eq!(config.level, Level::Error);
        assert_eq!(config.format, Format::Json);
    }

    #[test]
    fn test_color_follows_terminal() {
        let tty = LogConfig::from_lookup(lookup_from(&[("TERM", "xterm")]));
        assert!(tty.color);

        let no_color = LogConfig::from_lookup(lookup_from(&[("TERM", "xterm"), ("NO_COLOR", "1")]));
        assert!(!no_color.color);

        let forced = LogConfig::from_lookup(lookup_from(&[("BIBLIOTECA_LOG_COLOR", "0"), ("TERM", "xterm")]));
        assert!(!forced.color);
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LogConfig::default();
        init_with(&config);
        assert!(!init_with(&config));
    }
}
