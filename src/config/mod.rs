//! Configuration module for memaccess
//!
//! Provides configuration loading, validation, and default settings
//! for the `memaccess` command line tool.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults, DEFAULT_CONFIG_FILE};
pub use loader::ConfigLoader;
pub use validator::{validate_config, ConfigValidator, MAX_TRANSFER_LIMIT};

// Re-export the main configuration structures
pub use loader::{Config, LoggingConfig, MemoryConfig, TargetConfig};

// Configuration-related error type
pub use loader::ConfigError;
