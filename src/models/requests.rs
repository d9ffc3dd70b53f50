//! Request DTOs for the cache inspection API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Request body for `PUT /responses`
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key, e.g. `"categories:list"`
    pub key: String,
    /// JSON payload to cache
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

/// Request body for `POST /responses/invalidate`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Regular expression matched against keys
    pub pattern: String,
}

/// Query string for `GET /images`
#[derive(Debug, Clone, Deserialize)]
pub struct ImageQuery {
    pub url: String,
}
