//! Configuration management for the Surgeboard dashboard
//!
//! Handles loading configuration from files and environment variables and
//! validates all settings. The one secret is the events API bearer token;
//! it is deliberately optional so that a missing token degrades to a
//! visible warning instead of a startup crash.

use crate::SurgeboardError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the Surgeboard dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeboardConfig {
    /// Events API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Memo cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Web server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Events API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bearer token for the events API. Optional: when absent the dashboard
    /// serves a warning state instead of data.
    #[serde(default)]
    pub token: Option<String>,
    /// Base URL for the events API
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

/// Memo cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached responses
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

/// Web server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory served as the static frontend
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_api_base_url() -> String {
    "https://api.predicthq.com".to_string()
}

fn default_api_timeout() -> u64 {
    10
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_cache_max_entries() -> usize {
    256
}

fn default_server_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "frontend/dist".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_api_base_url(),
            timeout_seconds: default_api_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for SurgeboardConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            cache: CacheConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SurgeboardConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. SURGEBOARD__API__TOKEN
        builder = builder.add_source(
            Environment::with_prefix("SURGEBOARD")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SurgeboardConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // PREDICTHQ_API_TOKEN is the conventional name for the secret;
        // accept it when the config file carries none.
        if config.api.token.is_none() {
            if let Ok(token) = std::env::var("PREDICTHQ_API_TOKEN") {
                if !token.is_empty() {
                    config.api.token = Some(token);
                }
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("surgeboard").join("config.toml"))
    }

    /// True when the events API token is configured
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.api.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        if let Some(token) = &self.api.token {
            if token.is_empty() {
                return Err(SurgeboardError::config(
                    "Events API token cannot be empty if provided. Either remove it or provide a valid token."
                ).into());
            }
        }

        if self.api.timeout_seconds == 0 || self.api.timeout_seconds > 300 {
            return Err(SurgeboardError::config(
                "API timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(
                SurgeboardError::config("API base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        if self.cache.max_entries == 0 {
            return Err(SurgeboardError::config("Cache must allow at least one entry").into());
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SurgeboardError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SurgeboardConfig::default();
        assert_eq!(config.api.base_url, "https://api.predicthq.com");
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.cache.ttl_seconds, 600);
        assert_eq!(config.logging.level, "info");
        assert!(config.api.token.is_none());
        assert!(!config.has_token());
    }

    #[test]
    fn test_missing_token_is_valid() {
        // A missing token must degrade to a warning state, not fail validation
        let config = SurgeboardConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_token_is_invalid() {
        let mut config = SurgeboardConfig::default();
        config.api.token = Some(String::new());
        assert!(config.validate().is_err());
        assert!(!config.has_token());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = SurgeboardConfig::default();
        config.logging.level = "shouting".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid log level")
        );
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = SurgeboardConfig::default();
        config.api.timeout_seconds = 0;
        assert!(config.validate().is_err());
        config.api.timeout_seconds = 301;
        assert!(config.validate().is_err());
        config.api.timeout_seconds = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_path_generation() {
        let path = SurgeboardConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("surgeboard"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
