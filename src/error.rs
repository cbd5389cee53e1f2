//! Error types for the cache engine and its HTTP surface
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::EntryKind;

// == Cache Error Enum ==
/// Errors returned by engine operations.
///
/// A missing key is never an error; operations report absence through
/// their return value instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The key holds a different kind of value than the operation expects
    #[error("Value type mismatch for key '{key}': wanted {wanted}, got {actual}")]
    ValueTypeMismatch {
        key: String,
        wanted: EntryKind,
        actual: EntryKind,
    },

    /// JSON encoding or decoding failed in a convenience wrapper
    #[error("Serialization failed for key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Engine configuration is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Active cleaning was requested outside of a Tokio runtime
    #[error("Active cleaning requires a running Tokio runtime")]
    RuntimeUnavailable,
}

impl CacheError {
    pub(crate) fn mismatch(key: &str, wanted: EntryKind, actual: EntryKind) -> Self {
        CacheError::ValueTypeMismatch {
            key: key.to_string(),
            wanted,
            actual,
        }
    }

    pub(crate) fn serialization(key: &str, source: serde_json::Error) -> Self {
        CacheError::Serialization {
            key: key.to_string(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for engine operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// == API Error Enum ==
/// Errors surfaced by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Engine error
    #[error(transparent)]
    Cache(#[from] CacheError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Cache(CacheError::ValueTypeMismatch { .. }) => StatusCode::CONFLICT,
            ApiError::Cache(CacheError::Serialization { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
