//! Configuration management for the Zenduty provider
//!
//! Settings are layered from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//! 4. Command line flags (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use zenduty_provider::config::{Config, Overrides};
//!
//! let config = Config::load(&Overrides::default()).expect("Failed to load configuration");
//! println!("Talking to: {}", config.provider.base_url);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `ZENDUTY__<section>__<key>`:
//! - `ZENDUTY__PROVIDER__BASE_URL=https://zenduty.example.com`
//! - `ZENDUTY__HTTP__REQUEST_TIMEOUT=30s`
//!
//! The API token is also read from `ZENDUTY_API_KEY` when no other layer sets it.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/zenduty.toml`.
//! This can be overridden using the `ZENDUTY_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{Config, HttpConfig, LoggingConfig, ProviderConfig, RetryConfig};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub token: Option<String>,
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from all sources and apply `overrides` on top
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - No API token is available from any layer
    /// - Timeouts or retry bounds are invalid
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = sources::load(overrides.config_path.clone())?;
        config.apply(overrides);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    fn apply(&mut self, overrides: &Overrides) {
        if let Some(token) = &overrides.token {
            self.provider.token = Some(token.clone());
        }
        if let Some(base_url) = &overrides.base_url {
            self.provider.base_url = base_url.clone();
        }
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

        fs::write(&config_path, "[provider]\ntoken = \"abc\"\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.provider.token.as_deref(), Some("abc"));
        assert_eq!(config.retry.policy().max_elapsed.as_secs(), 60);
    }

    #[test]
    fn test_validation_catches_bad_base_url() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[provider]
token = "abc"
base_url = "ftp://zenduty.example.com"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(
            &config_path,
            "[provider]\ntoken = \"from-file\"\nbase_url = \"https://file.example.com\"\n",
        )
        .unwrap();

        let overrides = Overrides {
            config_path: Some(config_path),
            token: Some("from-flag".to_string()),
            base_url: Some("http://127.0.0.1:9000".to_string()),
        };
        let config = Config::load(&overrides).unwrap();
        assert_eq!(config.provider.token.as_deref(), Some("from-flag"));
        assert_eq!(config.provider.base_url, "http://127.0.0.1:9000");
    }
}
