//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MANGOSTEEN_BASE_URL` - Absolute http(s) base URL of the storefront the
//!   merge endpoint lives on
//!
//! ## Optional
//! - `MANGOSTEEN_STORAGE_PATH` - Path of the JSON storage file (default:
//!   `$XDG_CONFIG_HOME/mangosteen/storage.json`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::storage::{JsonFileStore, StorageError};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Storefront base URL, normalized without a trailing slash.
    pub base_url: String,
    /// Where the JSON file store keeps its data.
    pub storage_path: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `MANGOSTEEN_BASE_URL` is missing or not an
    /// absolute http(s) URL, or if no storage location can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let raw_base_url = get_required_env("MANGOSTEEN_BASE_URL")?;
        let base_url = parse_base_url("MANGOSTEEN_BASE_URL", &raw_base_url)?;

        let storage_path = match get_optional_env("MANGOSTEEN_STORAGE_PATH") {
            Some(path) => PathBuf::from(path),
            None => JsonFileStore::default_path()?,
        };

        Ok(Self {
            base_url,
            storage_path,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Validate the base URL and normalize away any trailing slash.
fn parse_base_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
