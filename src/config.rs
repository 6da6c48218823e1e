//! Configuration management for classic-monitor
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

mod defaults;

use crate::error::{ClassicError, Result};
use crate::logging::parse_log_level;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations searched by [`Config::load`], first match wins
pub const DEFAULT_PATHS: &[&str] = &["classic_monitor.yaml", "/etc/classic-monitor/config.yaml"];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Status file written by the acquisition daemon
    pub data_file: PathBuf,

    /// Optional YAML datapoint table replacing the built-in one
    pub registry_file: Option<PathBuf>,

    /// IANA timezone the snapshot header is written in
    pub timezone: String,

    /// Re-read interval in milliseconds; 0 decodes once and exits
    pub watch_interval_ms: u64,

    /// Wall-clock budget for one snapshot in watch mode
    pub evaluation_timeout_ms: u64,

    /// Report output options
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Indent the JSON report
    pub pretty: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file; its directory receives the rotated files
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to the console (stderr)
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        for path in DEFAULT_PATHS {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parsed [`Config::timezone`]
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ClassicError::validation(
                "timezone".to_string(),
                format!("Unknown timezone '{}'", self.timezone),
            )
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.data_file.as_os_str().is_empty() {
            return Err(ClassicError::validation("data_file", "Path cannot be empty"));
        }

        if let Some(path) = &self.registry_file {
            if path.as_os_str().is_empty() {
                return Err(ClassicError::validation(
                    "registry_file",
                    "Path cannot be empty when set",
                ));
            }
        }

        self.tz()?;

        if parse_log_level(&self.logging.level).is_err() {
            return Err(ClassicError::validation(
                "logging.level".to_string(),
                format!("Invalid log level: {}", self.logging.level),
            ));
        }

        if self.evaluation_timeout_ms == 0 {
            return Err(ClassicError::validation(
                "evaluation_timeout_ms",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}
