//! Error types for the quqifs library.

use thiserror::Error;

/// Main error type for quqifs operations.
#[derive(Error, Debug)]
pub enum QuqiError {
    /// Login was rejected by the remote service.
    #[error("Login rejected: {0}")]
    AuthError(String),

    /// Remote API returned a non-zero envelope code.
    #[error("API error: {code} - {message}")]
    ApiError { code: i64, message: String },

    /// Network request error (connection, timeout, body read).
    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    /// HTTP request failed with status code.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Local I/O error (temporary upload files, state files).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Path could not be resolved, even after reloading its ancestors.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Path resolved to a file where a directory was required.
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// Operation the remote service cannot express.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid or unexpected response from server.
    #[error("Invalid response from server")]
    InvalidResponse,

    /// Invalid persisted state format.
    #[error("Invalid state format: {0}")]
    InvalidState(String),

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl QuqiError {
    /// Whether the failure happened below the envelope layer (network, timeout, HTTP status).
    ///
    /// Nothing in this crate retries these; callers that want a retry policy can use this
    /// to decide.
    pub fn is_transport(&self) -> bool {
        matches!(self, QuqiError::TransportError(_) | QuqiError::HttpError(_))
    }

    /// Whether the failure means the path does not exist remotely.
    pub fn is_not_found(&self) -> bool {
        matches!(self, QuqiError::NotFound(_))
    }
}

/// Result type alias for quqifs operations.
pub type Result<T> = std::result::Result<T, QuqiError>;
