//! Terminal failures delivered to completion handles

use thiserror::Error;

use crate::admission::ValidationError;
use crate::llm::LlmError;

pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_ERROR";
pub const SHUTDOWN_CODE: &str = "COORDINATOR_SHUTDOWN";

/// Final error for one request, after any retries
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport { attempts: u32, source: LlmError },

    /// Processing the request panicked; the dispatcher caught it and moved on
    #[error("request processing panicked: {0}")]
    Internal(String),

    #[error("coordinator dropped the request before completing it")]
    Shutdown,
}

impl DispatchError {
    pub fn code(&self) -> &str {
        match self {
            DispatchError::Transport { source, .. } => source.code(),
            DispatchError::Internal(_) => INTERNAL_ERROR_CODE,
            DispatchError::Shutdown => SHUTDOWN_CODE,
        }
    }

    /// HTTP status of the last attempt, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Number of transport attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            DispatchError::Transport { attempts, .. } => *attempts,
            _ => 0,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Transport { source, .. } if source.is_timeout())
    }

    /// The underlying transport error
    pub fn llm_error(&self) -> Option<&LlmError> {
        match self {
            DispatchError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Rejection at the submission boundary; the request never reached the queue
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("too many submissions, retry after {retry_after:?}")]
    Throttled { retry_after: std::time::Duration },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl SubmitError {
    /// Equivalent HTTP status for a boundary that speaks HTTP
    pub fn http_status(&self) -> u16 {
        match self {
            SubmitError::Throttled { .. } => 429,
            SubmitError::Invalid(_) => 400,
        }
    }
}
