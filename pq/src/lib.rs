//! pacequeue - priority-ordered, rate-limited request coordinator
//!
//! Accepts completion requests from many concurrent callers, orders them by
//! caller-assigned priority, and sends them to a rate-limited completion
//! service one at a time.
//!
//! # Core Concepts
//!
//! - **Single Flight**: At most one outbound call is in progress at any time
//! - **Priority Then FIFO**: Higher priority first; equal priorities in submission order
//! - **Fixed Pacing**: After each completion the dispatcher waits one minute
//!   divided by the rate limit before taking the next request
//! - **Bounded Retries**: 429 and 5xx responses are retried with exponential backoff
//! - **Fault Isolation**: A failing request only affects its own completion handle
//!
//! # Modules
//!
//! - [`admission`] - Inbound validation and throttling
//! - [`coordinator`] - Queue, dispatcher, retry policy, and completion handles
//! - [`llm`] - Completion types and the HTTP transport
//! - [`domain`] - Priority and request IDs
//! - [`config`] - Configuration file loading
//! - [`cli`] - Command-line interface

pub mod admission;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod llm;

// Re-export commonly used types
pub use admission::{AdmissionThrottle, Admitted, FieldError, ValidationError, admit};
pub use config::Config;
pub use coordinator::{
    CompletionHandle, ConfigError, Coordinator, CoordinatorConfig, CoordinatorStats, DispatchError, DispatcherState,
    Gateway, PartialCoordinatorConfig, RetryPolicy, SubmitError, validate_config,
};
pub use domain::{Priority, RequestId};
pub use llm::{CompletionRequest, CompletionResponse, HttpClient, LlmClient, LlmError};
