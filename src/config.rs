//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! Configuration is loaded once by the embedding service and passed down explicitly.

use std::env;
use std::str::FromStr;

use crate::constants::{
    log_formats, DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS, DEFAULT_DATABASE_MAX_CONNECTIONS,
    DEFAULT_LOG_FILTER, DEFAULT_RULE_UPDATE_MAX_RETRIES,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: Option<DatabaseConfig>,
    pub engine: EngineConfig,
    pub log: LogConfig,
}

/// Database configuration. Absent when running against the in-memory store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Rule engine behaviour
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Retries for a rule edit that hit a concurrent modification
    pub rule_update_max_retries: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub filter: String,
    /// One of `log_formats::ALL`
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database: DatabaseConfig::from_env()?,
            engine: EngineConfig::from_env()?,
            log: LogConfig::from_env()?,
        })
    }

    /// Database settings, for callers that cannot run without Postgres.
    pub fn require_database(&self) -> Result<&DatabaseConfig, ConfigError> {
        self.database
            .as_ref()
            .ok_or_else(|| ConfigError::Missing("DATABASE_URL".to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rule_update_max_retries: DEFAULT_RULE_UPDATE_MAX_RETRIES,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            format: log_formats::PRETTY.to_string(),
        }
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Ok(url) = env::var("DATABASE_URL") else {
            return Ok(None);
        };

        Ok(Some(Self {
            url,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
            acquire_timeout_secs: parse_or(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS,
            )?,
        }))
    }
}

impl EngineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            rule_update_max_retries: parse_or(
                "RULE_UPDATE_MAX_RETRIES",
                DEFAULT_RULE_UPDATE_MAX_RETRIES,
            )?,
        })
    }
}

impl LogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let format = env::var("LOG_FORMAT").unwrap_or_else(|_| log_formats::PRETTY.to_string());
        validate_log_format(&format)?;

        Ok(Self {
            filter: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
            format,
        })
    }

    pub fn is_json(&self) -> bool {
        self.format == log_formats::JSON
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

fn validate_log_format(format: &str) -> Result<(), ConfigError> {
    if log_formats::ALL.contains(&format) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue("LOG_FORMAT".to_string()))
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
