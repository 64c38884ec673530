//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// One outbound call to the completion service
///
/// Implementations perform exactly one attempt per call and classify the
/// outcome through [`LlmError`]; they never retry internally.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
