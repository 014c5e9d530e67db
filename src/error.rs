//! Error types for the prefetch service
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Media Error Enum ==
/// Unified error type for the cache, fetch and persistence layers.
#[derive(Error, Debug)]
pub enum MediaError {
    /// Empty or otherwise unusable resource key
    #[error("Invalid resource key: {0:?}")]
    InvalidKey(String),

    /// Transport-level failure while fetching a resource
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned {status} for {url}")]
    Http { url: String, status: u16 },

    /// Fetch did not settle within the configured bound
    #[error("Fetch of {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    /// Bytes could not be decoded as an image header
    #[error("Decode error: {0}")]
    Decode(String),

    /// Snapshot storage I/O failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Snapshot (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        match (err.status(), err.url()) {
            (Some(status), Some(url)) => MediaError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            },
            _ => MediaError::Network(err.to_string()),
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::Storage(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = match &self {
            MediaError::InvalidKey(_) | MediaError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MediaError::Network(_) | MediaError::Http { .. } | MediaError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            MediaError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            MediaError::Storage(_) | MediaError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the prefetch service.
pub type Result<T> = std::result::Result<T, MediaError>;
