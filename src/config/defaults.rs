//! Default configuration values for memaccess

use crate::session::DEFAULT_MAX_TRANSFER_SIZE;
use serde::{Deserialize, Serialize};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "memaccess.toml";

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub target: TargetDefaults,
    pub memory: MemoryDefaults,
    pub logging: LoggingDefaults,
}

/// Default target selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDefaults {
    pub pointer_width: String,
}

/// Default memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDefaults {
    pub max_transfer_size: usize,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        target: TargetDefaults {
            pointer_width: "auto".to_string(),
        },
        memory: MemoryDefaults {
            max_transfer_size: DEFAULT_MAX_TRANSFER_SIZE, // 16MB
        },
        logging: LoggingDefaults {
            level: "warn".to_string(),
        },
    }
}
