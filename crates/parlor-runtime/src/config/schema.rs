//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use parlor_framework::ClientOptions;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ParlorConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Client session settings.
    #[serde(default)]
    pub client: ClientConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a lowercase string, as used in filter directives.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON. Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Write to `file_path`.
    File,
}

/// How often the log file is rotated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// A single file, never rotated.
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Log file path, used when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Log file rotation.
    #[serde(default)]
    pub rotation: LogRotation,

    /// Maximum number of rotated log files kept.
    #[serde(default = "default_max_files")]
    pub max_files: u32,

    /// Per-module level overrides, e.g. `parlor_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            rotation: LogRotation::default(),
            max_files: default_max_files(),
            filters: HashMap::new(),
        }
    }
}

fn default_max_files() -> u32 {
    5
}

// =============================================================================
// Client
// =============================================================================

/// Client session configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Maximum number of room members hydrated concurrently.
    #[serde(default = "default_member_concurrency")]
    pub member_concurrency: usize,

    /// Room cache capacity (0 = unbounded).
    #[serde(default)]
    pub room_cache_capacity: usize,

    /// Contact cache capacity (0 = unbounded).
    #[serde(default)]
    pub contact_cache_capacity: usize,

    /// Message cache capacity (0 = unbounded).
    #[serde(default)]
    pub message_cache_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            member_concurrency: default_member_concurrency(),
            room_cache_capacity: 0,
            contact_cache_capacity: 0,
            message_cache_capacity: 0,
        }
    }
}

impl ClientConfig {
    /// Converts to client session options.
    pub fn to_options(&self) -> ClientOptions {
        ClientOptions {
            member_concurrency: self.member_concurrency,
            room_cache_capacity: self.room_cache_capacity,
            contact_cache_capacity: self.contact_cache_capacity,
            message_cache_capacity: self.message_cache_capacity,
        }
    }
}

fn default_member_concurrency() -> usize {
    ClientOptions::default().member_concurrency
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_client_options() {
        assert_eq!(ClientConfig::default().to_options(), ClientOptions::default());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
logging:
  level: debug
  filters:
    parlor_framework: trace
client:
  member_concurrency: 4
"#;
        let config: ParlorConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(
            config.logging.filters.get("parlor_framework"),
            Some(&LogLevel::Trace)
        );
        assert_eq!(config.logging.max_files, 5);
        assert_eq!(config.client.member_concurrency, 4);
        assert_eq!(config.client.room_cache_capacity, 0);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let yaml = "logging:\n  level: loud\n";
        assert!(serde_yaml::from_str::<ParlorConfig>(yaml).is_err());
    }
}
