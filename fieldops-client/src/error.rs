//! Client error types

use thiserror::Error;

/// Coarse error classification used to pick the user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or non-2xx status
    Network,
    /// 401 / 403
    Auth,
    /// Resource missing on the server or locally
    NotFound,
    /// Missing or rejected input
    Validation,
}

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with an error body
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized | Self::Forbidden(_) => ErrorKind::Auth,
            Self::Api { status: 401 | 403, .. } => ErrorKind::Auth,
            Self::NotFound(_) | Self::Api { status: 404, .. } => ErrorKind::NotFound,
            Self::Validation(_) | Self::Api { status: 400 | 422, .. } => ErrorKind::Validation,
            _ => ErrorKind::Network,
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
