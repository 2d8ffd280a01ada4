//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional (all have defaults)
//! - `BRAVEX_API_URL` - Catalog API base URL (default: <http://localhost:1337>)
//! - `BRAVEX_PAYMENTS_URL` - Payment backend base URL (default: <http://localhost:1338>)
//! - `BRAVEX_BASE_URL` - Public site URL used for checkout return links
//!   (default: <http://localhost:5173>)
//! - `BRAVEX_CATALOG_PAGE_SIZE` - Products per catalog page (default: 8)
//! - `BRAVEX_FEED_PAGE_SIZE` - Posts per feed page (default: 8)
//! - `BRAVEX_CART_PATH` - File path for cart persistence; in-memory
//!   storage is used when absent

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Default number of items per catalog/feed page.
const DEFAULT_PAGE_SIZE: u32 = 8;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the catalog API.
    pub api_base_url: String,
    /// Base URL of the payment backend.
    pub payments_base_url: String,
    /// Public base URL of the storefront itself.
    pub base_url: String,
    /// Products per page in the catalog.
    pub catalog_page_size: u32,
    /// Posts per page in the blog feed.
    pub feed_page_size: u32,
    /// File path for cart persistence, when file storage is wanted.
    pub cart_storage_path: Option<PathBuf>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:1337".to_string(),
            payments_base_url: "http://localhost:1338".to_string(),
            base_url: "http://localhost:5173".to_string(),
            catalog_page_size: DEFAULT_PAGE_SIZE,
            feed_page_size: DEFAULT_PAGE_SIZE,
            cart_storage_path: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid
    /// (malformed URL, non-numeric page size).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let api_base_url =
            get_url_or_default("BRAVEX_API_URL", &defaults.api_base_url)?;
        let payments_base_url =
            get_url_or_default("BRAVEX_PAYMENTS_URL", &defaults.payments_base_url)?;
        let base_url = get_url_or_default("BRAVEX_BASE_URL", &defaults.base_url)?;
        let catalog_page_size =
            get_page_size("BRAVEX_CATALOG_PAGE_SIZE", defaults.catalog_page_size)?;
        let feed_page_size = get_page_size("BRAVEX_FEED_PAGE_SIZE", defaults.feed_page_size)?;
        let cart_storage_path = get_optional_env("BRAVEX_CART_PATH").map(PathBuf::from);

        Ok(Self {
            api_base_url,
            payments_base_url,
            base_url,
            catalog_page_size,
            feed_page_size,
            cart_storage_path,
        })
    }

    /// URL the payment provider returns the customer to on success.
    #[must_use]
    pub fn checkout_success_url(&self) -> String {
        format!("{}/cart/checkout-thanks/", self.base_url.trim_end_matches('/'))
    }

    /// URL the payment provider returns the customer to on cancel.
    #[must_use]
    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/cart/checkout2/", self.base_url.trim_end_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a URL-valued variable, validating it parses.
fn get_url_or_default(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = get_env_or_default(key, default);
    Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    // Trailing slashes would double up when joining endpoint paths.
    Ok(value.trim_end_matches('/').to_string())
}

/// Get a page-size variable, validating it is a positive integer.
fn get_page_size(key: &str, default: u32) -> Result<u32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let size = raw
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if size == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "page size must be at least 1".to_string(),
        ));
    }
    Ok(size)
}
