//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors surfaced to callers of the HTTP inspection API and the
/// pattern-invalidation helper. Cache lookups themselves never fail.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not present (or expired) in the response cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Storage Error Enum ==
/// Failures raised by a [`crate::images::KeyValueStorage`] backend.
///
/// The image cache catches these at the point of use, logs them, and treats
/// them as absence.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing would exceed the backend's quota
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    /// Stored record could not be decoded
    #[error("Corrupt record under {0}")]
    Corrupt(String),

    /// Underlying filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Fetch Error Enum ==
/// Failures raised by an [`crate::images::ImageFetcher`].
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, DNS, TLS or body-read failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("Unexpected status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
