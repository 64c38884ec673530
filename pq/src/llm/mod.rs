//! Transport to the completion service
//!
//! One call, one attempt: the client sends a request and classifies the
//! outcome. Retrying and pacing live in the coordinator.

pub mod client;
mod error;
mod http;
mod types;

pub use client::LlmClient;
pub use error::{LlmError, TIMEOUT_CODE, UNKNOWN_ERROR_CODE};
pub use http::HttpClient;
pub use types::{CompletionRequest, CompletionResponse};
