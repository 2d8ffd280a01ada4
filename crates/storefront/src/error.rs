//! Unified error handling for the storefront core.
//!
//! Each layer has its own `thiserror` enum and this module folds the
//! ones that reach callers into a single `StoreError`.
//! [`crate::cart::storage::StorageError`] never surfaces here: the cart
//! store degrades persistence failures to an empty cart and logs.
//! [`crate::config::ConfigError`] stays separate: configuration is
//! loaded once at startup, before any store exists.
//!
//! Validation failures are raised synchronously, before any network
//! call.

use thiserror::Error;

use crate::api::ApiError;

/// Application-level error type for the storefront core.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// User input was rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl StoreError {
    /// Whether this error is a not-found result rather than a failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound(_)))
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;
