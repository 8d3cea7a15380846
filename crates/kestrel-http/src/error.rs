//! HTTP client error types

use std::sync::Arc;

use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// Shared, cloneable transport failure.
///
/// Mocks hand the same preset error out on every resolution, so the source is
/// reference counted rather than owned.
pub type TransportError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request body could not be encoded for its content type
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] EncodeError),

    /// Rate limiter wait was cancelled before a token was issued
    #[error("Request cancelled while waiting for rate limiter")]
    Cancelled,

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header name or value rejected
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Network request failed, reported exactly as the transport saw it
    #[error(transparent)]
    Transport(TransportError),

    /// Response body could not be fully read
    #[error("Failed to read response body: {0}")]
    ReadBody(#[source] TransportError),

    /// Mocking is enabled but nothing matches the request
    #[error("no mock matching {method} from '{url}' with given body")]
    MockNotFound { method: String, url: String },

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),

    /// Response body does not match the requested type
    #[error("Failed to decode response body at line {line} column {column}: {source}")]
    Decode {
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl HttpError {
    /// Wrap any error as a transport failure
    pub fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HttpError::Transport(Arc::new(error))
    }

    /// Check if the request was abandoned at the rate limiter
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HttpError::Cancelled)
    }

    /// Check if mocking was on but no mock matched
    pub fn is_mock_miss(&self) -> bool {
        matches!(self, HttpError::MockNotFound { .. })
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(error: reqwest::Error) -> Self {
        HttpError::transport(error)
    }
}

/// Body serialization failures, one per supported encoding
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml: {0}")]
    Xml(String),

    #[error("form: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),
}
