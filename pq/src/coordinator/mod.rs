//! Priority-ordered, rate-limited request coordinator
//!
//! Requests flow through:
//! - **Gateway:** throttle and validate inbound submissions
//! - **Coordinator:** priority queue with a single-flight dispatcher that
//!   pauses for the pacing interval after every completion
//! - **RetryPolicy:** exponential backoff on 429 and 5xx responses
//!
//! Each caller gets a [`CompletionHandle`] that resolves exactly once.

mod config;
mod core;
mod error;
mod gateway;
mod handle;
mod queue;
mod retry;

pub use config::{
    ConfigError, CoordinatorConfig, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MODEL,
    DEFAULT_RATE_LIMIT_PER_MINUTE, DEFAULT_TIMEOUT_MS, MIN_TIMEOUT_MS, PartialCoordinatorConfig, validate_config,
};
pub use self::core::Coordinator;
pub use error::{DispatchError, INTERNAL_ERROR_CODE, SHUTDOWN_CODE, SubmitError};
pub use gateway::Gateway;
pub use handle::CompletionHandle;
pub use queue::{CoordinatorStats, DispatcherState, QueueState};
pub use retry::{Attempt, AttemptOutcome, BASE_BACKOFF, Delivery, RetryPolicy};
