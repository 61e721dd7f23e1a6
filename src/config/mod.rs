//! Configuration management for routebind
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use routebind::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `ROUTEBIND__<section>__<key>`
//!
//! Examples:
//! - `ROUTEBIND__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `ROUTEBIND__SERVER__MAX_BODY_BYTES=1048576`
//! - `ROUTEBIND__DISPATCH__STRICT_REQUIRED=true`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/routebind.toml`.
//! This can be overridden using the `ROUTEBIND_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, DispatchConfig, LoggingConfig, ServerConfig};
pub use validation::{MAX_BODY_LIMIT, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[dispatch]\nstrict_required = true\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert!(config.dispatch.strict_required);
        assert_eq!(config.server.bind_addr.port(), 8080);
    }

    #[test]
    fn test_validation_catches_zero_body_limit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[server]\nmax_body_bytes = 0\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::ZeroBodyLimit)
        ));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[server]\nbind_addr = \"not an address\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result.unwrap_err(), ConfigError::LoadError(_)));
    }
}
