//! Configuration for the sensor telemetry service.

use crate::core::{EndBound, QueryOptions, DEFAULT_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable overriding the bind host.
pub const HOST_ENV: &str = "SENSOR_TELEMETRY_HOST";
/// Environment variable overriding the bind port.
pub const PORT_ENV: &str = "SENSOR_TELEMETRY_PORT";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub host: String,

    /// Port to bind the HTTP server to
    pub port: u16,

    /// JSON dataset used to seed the in-memory store
    pub dataset_path: Option<PathBuf>,

    /// Whether a sample stamped exactly at `end_date` is returned
    pub end_bound: EndBound,

    /// Result cap applied when a data query gives no `limit`
    pub default_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dataset_path: None,
            end_bound: EndBound::default(),
            default_limit: DEFAULT_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from the default location, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)?
        } else {
            Self::default()
        };

        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parse and validate a configuration file's contents.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no query could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit < 1 {
            return Err(ConfigError::InvalidValue {
                key: "default_limit",
                value: self.default_limit.to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sensor-telemetry")
            .join("config.json")
    }

    /// Apply `SENSOR_TELEMETRY_HOST` / `SENSOR_TELEMETRY_PORT` from `lookup`.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup(HOST_ENV) {
            self.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: PORT_ENV,
                value: port.clone(),
            })?;
        }
        Ok(self)
    }

    /// Query parsing options derived from this configuration.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            end_bound: self.end_bound,
            default_limit: self.default_limit,
        }
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value '{value}' for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Invalid value '{value}' for {key} in config file")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_limit, 1000);
        assert_eq!(config.end_bound, EndBound::Exclusive);
        assert!(config.dataset_path.is_none());
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.query_options(), QueryOptions::default());
    }

    #[test]
    fn test_zero_default_limit_is_rejected() {
        let err = Config::from_json(r#"{"default_limit": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "default_limit",
                ..
            }
        ));

        let config = Config::from_json(r#"{"default_limit": 1}"#).unwrap();
        assert_eq!(config.query_options().default_limit, 1);
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_config_file() {
        let config = Config::from_json(r#"{"port": 9000, "end_bound": "inclusive"}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.end_bound, EndBound::Inclusive);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(HOST_ENV, "0.0.0.0"), (PORT_ENV, "3000")].into();
        let config = Config::default()
            .with_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");

        let err = Config::default()
            .with_env_overrides(|key| (key == PORT_ENV).then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: PORT_ENV, .. }));
    }
}
