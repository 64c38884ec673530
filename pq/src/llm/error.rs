//! Transport error types

use std::time::Duration;
use thiserror::Error;

/// Code reported when the service did not supply one
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";

/// Code reported for per-attempt timeouts
pub const TIMEOUT_CODE: &str = "TIMEOUT";

/// Outcome of a single failed outbound call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited (429): {message}")]
    RateLimited { code: Option<String>, message: String },

    #[error("API error {status}: {message}")]
    ApiError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The attempt exceeded the configured timeout. Whether it may be retried
    /// is decided by the transport from the retry budget.
    #[error("Timeout after {after:?}")]
    Timeout { after: Duration, retryable: bool },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout { .. })
    }

    /// Check if this error is retryable: 429, any 5xx, or a retryable timeout
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => (500..600).contains(status),
            LlmError::Timeout { retryable, .. } => *retryable,
            LlmError::Network(_) => false,
            LlmError::InvalidResponse(_) => false,
            LlmError::Json(_) => false,
        }
    }

    /// HTTP status of the failed attempt, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::RateLimited { .. } => Some(429),
            LlmError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error code: the service-supplied code when present
    pub fn code(&self) -> &str {
        match self {
            LlmError::RateLimited { code: Some(code), .. } | LlmError::ApiError { code: Some(code), .. } => code,
            LlmError::Timeout { .. } => TIMEOUT_CODE,
            _ => UNKNOWN_ERROR_CODE,
        }
    }
}
