//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::MAX_KEY_LENGTH;

/// Request body for pattern invalidation (POST /cache/invalidate)
///
/// # Fields
/// - `pattern`: Literal substring; every key containing it is removed
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidatePatternRequest {
    pub pattern: String,
}

impl InvalidatePatternRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        if self.pattern.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Pattern exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}
