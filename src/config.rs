//! Configuration for the commonpool server.
//!
//! Defaults, optional TOML file, `COMMONPOOL_*` environment overrides, and
//! validation, in that order of precedence (CLI flags are applied on top by
//! the binary).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::errors::ConfigError;
use crate::registry::RegistrySettings;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonpoolConfig {
    pub api: ApiSettings,
    pub registry: RegistrySettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Configuration loader with environment variable support.
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path.
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables.
    pub fn load(&self) -> Result<CommonpoolConfig, ConfigError> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            CommonpoolConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> Result<CommonpoolConfig, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(&self, config: &mut CommonpoolConfig) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("COMMONPOOL_API_HOST") {
            config.api.host = host;
        }
        if let Ok(port) = env::var("COMMONPOOL_API_PORT") {
            config.api.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "COMMONPOOL_API_PORT".to_string(),
                value: port,
                reason: "Invalid port number".to_string(),
            })?;
        }
        if let Ok(origins) = env::var("COMMONPOOL_CORS_ORIGINS") {
            config.api.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(max_age) = env::var("COMMONPOOL_MAX_AGE_SECS") {
            config.registry.max_age_secs =
                max_age.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "COMMONPOOL_MAX_AGE_SECS".to_string(),
                    value: max_age,
                    reason: "Invalid duration in seconds".to_string(),
                })?;
        }
        if let Ok(interval) = env::var("COMMONPOOL_SWEEP_INTERVAL_SECS") {
            config.registry.sweep_interval_secs =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "COMMONPOOL_SWEEP_INTERVAL_SECS".to_string(),
                    value: interval,
                    reason: "Invalid duration in seconds".to_string(),
                })?;
        }

        Ok(())
    }

    fn validate(&self, config: &CommonpoolConfig) -> Result<(), ConfigError> {
        if config.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.port".to_string(),
                value: "0".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }
        if config.api.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.request_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Timeout cannot be zero".to_string(),
            });
        }
        if config.registry.max_age_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "registry.max_age_secs".to_string(),
                value: "0".to_string(),
                reason: "Max age cannot be zero".to_string(),
            });
        }
        if config.registry.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "registry.sweep_interval_secs".to_string(),
                value: "0".to_string(),
                reason: "Sweep interval cannot be zero".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to file (used for generating samples).
    pub fn save(&self, config: &CommonpoolConfig, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write to {}: {}", path, e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = CommonpoolConfig::default();
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.registry.max_age_secs, 3600);
        assert_eq!(config.registry.sweep_interval_secs, 1800);
    }

    #[test]
    fn test_config_validation() {
        let loader = ConfigLoader::new();
        let mut config = CommonpoolConfig::default();
        assert!(loader.validate(&config).is_ok());

        config.api.port = 0;
        assert!(loader.validate(&config).is_err());

        config.api.port = 8080;
        config.registry.max_age_secs = 0;
        assert!(loader.validate(&config).is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[api]\nport = 9000\n").unwrap();

        let config = ConfigLoader::new()
            .with_path(temp_file.path())
            .load()
            .unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.registry.max_age_secs, 3600);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let mut original = CommonpoolConfig::default();
        original.api.port = 9100;
        original.registry.max_age_secs = 600;

        let loader = ConfigLoader::new();
        loader.save(&original, path).unwrap();

        let loaded = ConfigLoader::new().with_path(path).load().unwrap();
        assert_eq!(loaded.api.port, 9100);
        assert_eq!(loaded.registry.max_age_secs, 600);
    }
}
