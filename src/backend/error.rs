//! Error types for backend requests

use thiserror::Error;

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Failures surfaced by the remote data and auth services. Expected
/// failures are values, never panics; nothing here is retried.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("no matching row in {table}")]
    NotFound { table: String },

    #[error("constraint violation ({code}): {message}")]
    Constraint { code: String, message: String },

    #[error("backend error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    pub fn not_found(table: impl Into<String>) -> Self {
        Self::NotFound { table: table.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
