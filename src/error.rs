//! Error types for the storefront cache
//!
//! Provides unified error handling using thiserror. Store-level errors never
//! reach business callers of [`crate::cache::Cache`]; they only surface through
//! the `CacheStore` core and the admin HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// TTL must be a positive number of seconds
    #[error("Invalid TTL for key {0}: must be greater than zero")]
    InvalidTtl(String),

    /// Key exceeds the maximum key length
    #[error("Key exceeds maximum length of {max} bytes ({len} given)")]
    KeyTooLong { len: usize, max: usize },

    /// Cache cannot admit any entry
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Value could not be serialized or deserialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidTtl(_)
            | CacheError::KeyTooLong { .. }
            | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::CacheFull(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
