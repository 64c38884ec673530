//! HTTP client for the completion service
//!
//! Implements the LlmClient trait with a single POST per call. Retrying is
//! left to the coordinator's retry policy; this client only classifies.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use crate::coordinator::CoordinatorConfig;

/// Completion service client
pub struct HttpClient {
    base_url: String,
    api_key: String,
    default_model: String,
    http: Client,
    timeout: Duration,
    /// Retry budget; a timeout is only worth retrying when this is non-zero
    max_retries: u32,
}

impl HttpClient {
    /// Create a new client from validated configuration
    pub fn from_config(config: &CoordinatorConfig) -> Result<Self, LlmError> {
        debug!(?config, "HttpClient::from_config: called");
        Self::new(
            config.base_url(),
            config.credential(),
            config.default_model(),
            config.timeout(),
            config.max_retries(),
        )
    }

    fn new(
        base_url: &str,
        api_key: &str,
        default_model: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            default_model: default_model.to_string(),
            http,
            timeout,
            max_retries,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/complete", self.base_url)
    }

    /// Build the request body: the caller's payload plus a default model
    fn build_request_body(&self, request: &CompletionRequest) -> Result<serde_json::Value, LlmError> {
        debug!(model = ?request.model, "build_request_body: called");
        let mut body = serde_json::to_value(request)?;

        if request.model.is_none() {
            debug!(default_model = %self.default_model, "build_request_body: no model, using default");
            body["model"] = serde_json::json!(self.default_model);
        }

        Ok(body)
    }

    /// Map a reqwest failure to a transport error
    fn classify_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            debug!(retryable = self.max_retries > 0, "classify_send_error: timeout");
            LlmError::Timeout {
                after: self.timeout,
                retryable: self.max_retries > 0,
            }
        } else {
            debug!(error = %err, "classify_send_error: network error");
            LlmError::Network(err)
        }
    }

    /// Map a non-success status and its body to a transport error
    fn classify_status(status: StatusCode, body: &str) -> LlmError {
        debug!(%status, "classify_status: called");
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => (
                envelope.error.code.or(envelope.error.kind),
                envelope.error.message.unwrap_or_else(|| body.to_string()),
            ),
            Err(_) => (None, body.to_string()),
        };

        if status == StatusCode::TOO_MANY_REQUESTS {
            LlmError::RateLimited { code, message }
        } else {
            LlmError::ApiError {
                status: status.as_u16(),
                code,
                message,
            }
        }
    }
}

#[async_trait]
impl LlmClient for HttpClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_request_body(request)?;
        debug!(url = %self.endpoint(), "complete: sending");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify_send_error(e))?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &text));
        }

        debug!(%status, "complete: success");
        Ok(serde_json::from_str(&text)?)
    }
}

// Error response types

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}
