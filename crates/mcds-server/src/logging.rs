//! Structured logging for the MaxCompute backend
//!
//! Console output in pretty, JSON or compact form, optionally mirrored to a
//! daily rolling file.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE: &str = "mcds-server.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development
    Pretty,
    /// JSON format for production
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    /// Unknown or missing values fall back to pretty output
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("json") => LogFormat::Json,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    File,
    Both,
}

impl LogOutput {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_OUTPUT").ok().as_deref())
    }

    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("file") => LogOutput::File,
            Some("both") => LogOutput::Both,
            _ => LogOutput::Stdout,
        }
    }
}

fn log_dir() -> String {
    std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string())
}

fn file_appender() -> RollingFileAppender {
    let dir = log_dir();
    std::fs::create_dir_all(&dir).ok();
    RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE)
}

/// Initialize the logging system
///
/// Environment variables:
/// - `RUST_LOG`: Log level (e.g., "debug", "info", "mcds_registry=debug")
/// - `LOG_FORMAT`: Output format ("pretty", "json", "compact")
/// - `LOG_OUTPUT`: Where to write logs ("stdout", "file", "both")
/// - `LOG_DIR`: Directory for log files (default: "./logs")
///
/// ```bash
/// # Watch type resolution while expanding a query
/// RUST_LOG=mcds_registry=debug,mcds_macros=trace mcds-server interpolate ...
/// ```
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init() {
    let format = LogFormat::from_env();
    let output = LogOutput::from_env();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    match output {
        LogOutput::Stdout => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .init();
        }
        LogOutput::File => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(file_appender()).with_ansi(false))
                .init();
        }
        LogOutput::Both => {
            let file_layer = fmt::layer()
                .with_writer(file_appender())
                .with_ansi(false)
                .boxed();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .with(file_layer)
                .init();
        }
    }

    tracing::debug!(format = ?format, output = ?output, "logging initialized");
    if matches!(output, LogOutput::File | LogOutput::Both) {
        tracing::debug!(dir = %log_dir(), file = LOG_FILE, "writing log files");
    }
}
