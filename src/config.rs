//! Configuration management for the store
//!
//! TOML configuration with environment variable overrides and defaults for
//! every field, so an empty file (or no file at all) is a valid setup.
//!
//! ```toml
//! [ingest]
//! max_line_length = 1048576
//!
//! [backfill]
//! steps = 10
//! step = "1m"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::error::{Error, Result};
use crate::ingestion::protocol::ExpositionConfig;

/// Upper bound on `ingest.max_line_length`
const MAX_LINE_LENGTH_LIMIT: usize = 64 * 1024 * 1024;

/// Upper bound on `backfill.steps`
const MAX_BACKFILL_STEPS: usize = 100_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Backfill defaults
    #[serde(default)]
    pub backfill: BackfillConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ingestion configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Longest accepted exposition line in bytes
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Timestamp (ms) given to samples without one; wall clock when unset
    #[serde(default)]
    pub default_timestamp_ms: Option<i64>,
}

/// Backfill configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackfillConfig {
    /// Synthetic points generated per series
    #[serde(default = "default_backfill_steps")]
    pub steps: usize,

    /// Spacing between synthetic points, e.g. "1m" or "1h30m"
    #[serde(default = "default_backfill_step")]
    pub step: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Include the event target in log lines
    #[serde(default = "default_true")]
    pub with_target: bool,
}

// Default value functions
fn default_max_line_length() -> usize { 1024 * 1024 }
fn default_backfill_steps() -> usize { 10 }
fn default_backfill_step() -> String { "1m".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            default_timestamp_ms: None,
        }
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            steps: default_backfill_steps(),
            step: default_backfill_step(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: true,
        }
    }
}

impl IngestConfig {
    /// Parser settings derived from this section
    pub fn parser_config(&self) -> ExpositionConfig {
        ExpositionConfig {
            max_line_length: self.max_line_length,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    ///
    /// Unparseable numeric values are ignored.
    pub fn apply_env_overrides(&mut self) {
        // Ingest
        if let Ok(len) = std::env::var("PROMSTORE_MAX_LINE_LENGTH") {
            if let Ok(l) = len.parse() {
                self.ingest.max_line_length = l;
            }
        }

        // Backfill
        if let Ok(steps) = std::env::var("PROMSTORE_BACKFILL_STEPS") {
            if let Ok(s) = steps.parse() {
                self.backfill.steps = s;
            }
        }
        if let Ok(step) = std::env::var("PROMSTORE_BACKFILL_STEP") {
            self.backfill.step = step;
        }

        // Logging
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            self.logging.level = log_level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.ingest.max_line_length == 0 {
            return Err(Error::Configuration(
                "ingest.max_line_length must be > 0".to_string(),
            ));
        }
        if self.ingest.max_line_length > MAX_LINE_LENGTH_LIMIT {
            return Err(Error::Configuration(format!(
                "ingest.max_line_length cannot exceed {}",
                MAX_LINE_LENGTH_LIMIT
            )));
        }

        if self.backfill.steps > MAX_BACKFILL_STEPS {
            return Err(Error::Configuration(format!(
                "backfill.steps cannot exceed {}",
                MAX_BACKFILL_STEPS
            )));
        }
        match parse_duration(&self.backfill.step) {
            Ok(ms) if ms > 0 => {}
            Ok(_) => {
                return Err(Error::Configuration(
                    "backfill.step must be longer than 0ms".to_string(),
                ))
            }
            Err(e) => return Err(Error::Configuration(format!("backfill.step: {}", e))),
        }

        if self.logging.level.trim().is_empty() {
            return Err(Error::Configuration(
                "logging.level cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents).map_err(|e| Error::io(path, e))
    }
}
