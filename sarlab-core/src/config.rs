//! TOML configuration for a SAR run.
//!
//! ```toml
//! warmup = "trim"
//!
//! [parameters]
//! acceleration_step = 0.02
//! max_acceleration_factor = 0.2
//! initial_step = 0.01   # optional, defaults to acceleration_step
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::error::SarError;
use crate::indicators::SarParams;
use crate::warmup::WarmupPolicy;

/// Errors from loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid parameters: {0}")]
    Invalid(#[from] SarError),
}

/// Parameters plus output policy for one computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SarConfig {
    #[serde(default)]
    pub warmup: WarmupPolicy,

    #[serde(default)]
    pub parameters: SarParams,
}

impl SarConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SarConfig = toml::from_str(content)?;
        config.parameters.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
