//! Configuration validator for memaccess
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, MemoryConfig, TargetConfig};

/// Largest transfer limit a configuration may request
pub const MAX_TRANSFER_LIMIT: usize = 256 * 1024 * 1024;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_target(&config.target)?;
        Self::validate_memory(&config.memory)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    fn validate_target(target: &TargetConfig) -> Result<(), ConfigError> {
        if target.process.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Invalid(
                "Target process name cannot be empty".to_string(),
            ));
        }

        if target.module.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Invalid(
                "Target module name cannot be empty".to_string(),
            ));
        }

        target.pointer_width()?;
        Ok(())
    }

    fn validate_memory(memory: &MemoryConfig) -> Result<(), ConfigError> {
        if memory.max_transfer_size == 0 {
            return Err(ConfigError::Invalid(
                "Maximum transfer size must be greater than 0".to_string(),
            ));
        }

        if memory.max_transfer_size > MAX_TRANSFER_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "Maximum transfer size cannot exceed {} bytes",
                MAX_TRANSFER_LIMIT
            )));
        }

        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_names() {
        let mut config = Config::default();
        config.target.process = Some(String::new());
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("process"));

        config.target.process = Some("game.exe".to_string());
        config.target.module = Some(String::new());
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("module"));
    }

    #[test]
    fn test_invalid_pointer_width() {
        let mut config = Config::default();
        config.target.pointer_width = "16".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("pointer width"));

        for width in ["auto", "AUTO", "32", "64"] {
            config.target.pointer_width = width.to_string();
            assert!(validate_config(&config).is_ok(), "{width} should be valid");
        }
    }

    #[test]
    fn test_transfer_size_bounds() {
        let mut config = Config::default();
        config.memory.max_transfer_size = 0;
        assert!(validate_config(&config).is_err());

        config.memory.max_transfer_size = MAX_TRANSFER_LIMIT + 1;
        assert!(validate_config(&config).is_err());

        config.memory.max_transfer_size = 1;
        assert!(validate_config(&config).is_ok());

        config.memory.max_transfer_size = MAX_TRANSFER_LIMIT;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("log level"));
    }
}
