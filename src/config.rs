//! Ambient configuration for the `genquery2c` binary and any embedder that
//! wants to tune the optional compile cache. The compiler itself needs no
//! configuration to run — `compile()` takes everything it needs as
//! arguments — this only governs the cache and CLI ergonomics around it.

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Runtime configuration for the compile cache described in the
/// concurrency model: a bounded map keyed by source + options, guarded so
/// concurrent compilations never corrupt it.
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Whether compiled SQL is cached at all.
    pub cache_enabled: bool,

    /// Maximum number of distinct `(source, admin_mode, invoking_user)`
    /// entries the cache retains before evicting the oldest.
    #[validate(range(min = 1, max = 1_000_000, message = "cache capacity must be between 1 and 1,000,000"))]
    pub cache_capacity: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_capacity: 1024,
        }
    }
}

impl CompilerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            cache_enabled: parse_env_var("GENQUERY2_CACHE_ENABLED", "true")?,
            cache_capacity: parse_env_var("GENQUERY2_CACHE_CAPACITY", "1024")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            cache_enabled: cli.cache_enabled,
            cache_capacity: cli.cache_capacity,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// Configuration sourced from CLI flags, mirrored into [`CompilerConfig`].
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub cache_enabled: bool,
    pub cache_capacity: usize,
}

fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn from_env_honors_overrides_and_restores_defaults() {
        std::env::set_var("GENQUERY2_CACHE_ENABLED", "false");
        std::env::set_var("GENQUERY2_CACHE_CAPACITY", "42");

        let config = CompilerConfig::from_env().unwrap();
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_capacity, 42);

        std::env::remove_var("GENQUERY2_CACHE_ENABLED");
        std::env::remove_var("GENQUERY2_CACHE_CAPACITY");
    }

    #[test]
    fn default_config_validates() {
        let config = CompilerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.cache_enabled);
        assert_eq!(config.cache_capacity, 1024);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = CompilerConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
