//! Process configuration for the MaxCompute backend
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (row limit, default timeout, logging)
//! 2. .env file - loaded into the environment before anything is read
//!
//! Environment variables always override config.yaml values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar { name: &'static str, value: String },
}

/// Query execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Rows read into a frame before the result is truncated
    pub row_limit: usize,

    /// Connection timeout used when the data source does not set one
    pub default_timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            row_limit: 1_000_000,
            default_timeout_secs: 30,
        }
    }
}

impl QueryConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        let mut config = Config::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides, reading each variable through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(limit) = lookup("MCDS_ROW_LIMIT") {
            self.query.row_limit = limit.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "MCDS_ROW_LIMIT",
                value: limit.clone(),
            })?;
        }
        if let Some(timeout) = lookup("MCDS_DEFAULT_TIMEOUT") {
            self.query.default_timeout_secs =
                timeout.parse().map_err(|_| ConfigError::InvalidEnvVar {
                    name: "MCDS_DEFAULT_TIMEOUT",
                    value: timeout.clone(),
                })?;
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(output) = lookup("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.logging.directory = dir;
        }

        Ok(())
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}
