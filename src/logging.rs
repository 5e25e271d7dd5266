//! Structured logging via the `tracing` crate
//!
//! Background indexing work must stay observable without a UI: the build
//! and sync paths emit structured events, and this module wires them to a
//! subscriber configured from file/environment settings.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Log file path; `None` logs to stdout.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Colored output (text format, stdout only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            file: None,
            color: default_true(),
        }
    }
}

/// Initialize the logging system.
///
/// The `TREESYNC_LOG` environment variable takes priority over the
/// configured level and accepts full `EnvFilter` directives.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = build_env_filter(config)?;

    if config.format != "json" && config.format != "text" {
        return Err(ConfigError::Load(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            config.format
        )));
    }

    let base = Registry::default().with(filter);

    match (&config.file, config.format.as_str()) {
        (Some(path), format) => {
            let writer = open_log_file(path)?;
            if format == "json" {
                base.with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(writer),
                )
                .init();
            } else {
                base.with(
                    fmt::layer()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            }
        }
        (None, "json") => {
            base.with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stdout),
            )
            .init();
        }
        (None, _) => {
            base.with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color)
                    .with_writer(std::io::stdout),
            )
            .init();
        }
    }

    Ok(())
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_env("TREESYNC_LOG") {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| ConfigError::Load(format!("Invalid log level: {}", e)))
}

fn open_log_file(path: &PathBuf) -> Result<std::fs::File, ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Load(format!("Failed to create log directory: {}", e)))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ConfigError::Load(format!("Failed to open log file {:?}: {}", path, e)))
}
