//! Source API error types.

use thiserror::Error;

/// Result type for source API operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Delay assumed for a 429 without a usable Retry-After header.
const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 1000;

/// Errors that can occur while talking to Spotify or YouTube.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(#[from] songset_models::ModelError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    pub fn missing_credentials(msg: impl Into<String>) -> Self {
        Self::MissingCredentials(msg.into())
    }

    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an HTTP error status to an error variant.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::AuthError(message),
            403 => Self::PermissionDenied(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(DEFAULT_RATE_LIMIT_DELAY_MS),
            500..=599 => Self::ServerError { status, message },
            _ => Self::RequestFailed { status, message },
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SourceError::AuthError(_) => Some(401),
            SourceError::PermissionDenied(_) => Some(403),
            SourceError::NotFound(_) => Some(404),
            SourceError::RateLimited(_) => Some(429),
            SourceError::ServerError { status, .. } | SourceError::RequestFailed { status, .. } => {
                Some(*status)
            }
            SourceError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if error is retryable (network, 429, 5xx).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::Network(_) | SourceError::RateLimited(_) | SourceError::ServerError { .. }
        )
    }

    /// Server-requested delay before retrying.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SourceError::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}
