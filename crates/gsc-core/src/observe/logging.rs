//! # Log subscriber setup
//!
//! The canceller only emits `tracing` events: construction details at
//! `debug`, the first numeric recovery of each kind at `warn` and later ones
//! at `debug`. Applications that have no subscriber of their own can install
//! one here.
//!
//! ```rust,ignore
//! use gsc_core::observe::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::verbose());
//! ```
//!
//! `RUST_LOG`, when set, takes precedence over the configured directives.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Encoding of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single line per event
    #[default]
    Text,
    /// One JSON object per event, fields flattened
    Json,
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. "gsc_core=debug,warn"
    pub directives: String,
    pub format: LogFormat,
    /// Attach file:line to each event
    pub source_location: bool,
    /// Colored text output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directives: "gsc_core=warn".to_string(),
            format: LogFormat::Text,
            source_location: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Every canceller event including per-frame recovery details.
    pub fn verbose() -> Self {
        Self {
            directives: "gsc_core=debug".to_string(),
            source_location: true,
            ..Self::default()
        }
    }

    /// JSON lines for log collectors.
    pub fn json() -> Self {
        Self {
            format: LogFormat::Json,
            ansi: false,
            ..Self::default()
        }
    }

    /// `RUST_LOG` first, then the configured directives, then `warn`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.directives))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Install the global subscriber.
///
/// Returns false when a global subscriber already exists; it is left in
/// place.
pub fn init_logging(config: &LogConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    let installed = match config.format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_ansi(config.ansi)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            )
            .try_init(),
    };

    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let verbose = LogConfig::verbose();
        assert_eq!(verbose.directives, "gsc_core=debug");
        assert!(verbose.source_location);
        assert_eq!(verbose.format, LogFormat::Text);

        let json = LogConfig::json();
        assert_eq!(json.format, LogFormat::Json);
        assert!(!json.ansi);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: LogConfig = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, "gsc_core=warn");
        assert!(config.ansi);
    }

    #[test]
    fn test_second_init_is_ignored() {
        let config = LogConfig {
            directives: "gsc_core=error".to_string(),
            ..LogConfig::default()
        };
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}
