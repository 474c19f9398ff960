//! Configuration management for mediagate
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use mediagate::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `MEDIAGATE__<section>__<key>`
//!
//! Examples:
//! - `MEDIAGATE__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `MEDIAGATE__UPSTREAM__REQUEST_TIMEOUT=30s`
//! - `MEDIAGATE__FIRESTORE__COLLECTION=myvue3food`
//!
//! Secrets are only read from the environment:
//! - `GOOGLE_APPLICATION_CREDENTIALS_B64`: base64-encoded service account JSON
//! - `YOUTUBE_API_KEY`: YouTube Data API key
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/mediagate.toml`.
//! This can be overridden using the `MEDIAGATE_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{
    BilibiliConfig, Config, FirestoreConfig, ServerConfig, UpstreamConfig, YoutubeConfig,
};
pub use sources::{CREDENTIALS_ENV_VAR, YOUTUBE_API_KEY_ENV_VAR};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Required environment variable {0} is not set")]
    MissingSecret(&'static str),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`MEDIAGATE__*`)
    /// 2. TOML file (default: `config/mediagate.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Secrets are not read; tests set them directly.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Base64 service account blob, required to start serving
    pub fn firestore_credentials(&self) -> Result<&str, ConfigError> {
        self.firestore
            .credentials_b64
            .as_deref()
            .ok_or(ConfigError::MissingSecret(CREDENTIALS_ENV_VAR))
    }

    /// YouTube API key, required to start serving
    pub fn youtube_api_key(&self) -> Result<&str, ConfigError> {
        self.youtube
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingSecret(YOUTUBE_API_KEY_ENV_VAR))
    }
}
