//! Configuration loader for memaccess
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use crate::core::types::PointerWidth;
use crate::session::AttachOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_target")]
    pub target: TargetConfig,

    #[serde(default = "default_memory")]
    pub memory: MemoryConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Which process and module to attach to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// `auto`, `32` or `64`
    #[serde(default = "default_pointer_width")]
    pub pointer_width: String,
}

/// Memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_max_transfer_size")]
    pub max_transfer_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl TargetConfig {
    /// Forced pointer width, `None` for auto-detection
    pub fn pointer_width(&self) -> Result<Option<PointerWidth>, ConfigError> {
        if self.pointer_width.eq_ignore_ascii_case("auto") {
            return Ok(None);
        }
        self.pointer_width
            .parse::<PointerWidth>()
            .map(Some)
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "Invalid pointer width: {}. Must be one of: auto, 32, 64",
                    self.pointer_width
                ))
            })
    }
}

impl Config {
    /// Session options described by this configuration
    pub fn attach_options(&self) -> Result<AttachOptions, ConfigError> {
        Ok(AttachOptions {
            pointer_width: self.target.pointer_width()?,
            max_transfer_size: Some(self.memory.max_transfer_size),
        })
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Path this loader reads from
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults only when the file is missing
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }
}

// Default functions for serde
fn default_target() -> TargetConfig {
    TargetConfig {
        process: None,
        module: None,
        pointer_width: default_pointer_width(),
    }
}

fn default_memory() -> MemoryConfig {
    MemoryConfig {
        max_transfer_size: default_max_transfer_size(),
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
    }
}

// Individual field defaults
fn default_pointer_width() -> String {
    default_config().target.pointer_width
}

fn default_max_transfer_size() -> usize {
    default_config().memory.max_transfer_size
}

fn default_log_level() -> String {
    default_config().logging.level
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target: default_target(),
            memory: default_memory(),
            logging: default_logging(),
        }
    }
}
