//! Gateway - the submission boundary in front of the coordinator

use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, warn};

use super::core::Coordinator;
use super::error::SubmitError;
use super::handle::CompletionHandle;
use crate::admission::{AdmissionThrottle, admit};

/// Throttles, validates, and queues inbound submissions
///
/// A rejected submission returns immediately and never reaches the queue.
pub struct Gateway {
    coordinator: Coordinator,
    throttle: Option<Mutex<AdmissionThrottle>>,
}

impl Gateway {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            throttle: None,
        }
    }

    pub fn with_throttle(mut self, throttle: AdmissionThrottle) -> Self {
        self.throttle = Some(Mutex::new(throttle));
        self
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Submit `{ "payload": {...}, "priority": N }` on behalf of `caller`
    pub fn submit(&self, caller: &str, submission: &Value) -> Result<CompletionHandle, SubmitError> {
        debug!(%caller, "Gateway::submit: called");

        if let Some(throttle) = &self.throttle {
            let mut throttle = throttle.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(retry_after) = throttle.check_and_record(caller) {
                warn!(%caller, ?retry_after, "Submission throttled");
                return Err(SubmitError::Throttled { retry_after });
            }
        }

        let admitted = admit(submission).inspect_err(|e| {
            warn!(%caller, fields = ?e.fields(), "Submission rejected");
        })?;

        Ok(self.coordinator.submit(admitted.request, admitted.priority))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::RetryPolicy;
    use crate::domain::Priority;
    use crate::llm::client::mock::MockLlmClient;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn gateway(client: Arc<MockLlmClient>) -> Gateway {
        Gateway::new(Coordinator::with_policy(
            client,
            RetryPolicy::new(0),
            Duration::from_millis(100),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_submission_is_dispatched() {
        let client = Arc::new(MockLlmClient::succeeding());
        let gateway = gateway(client.clone());

        let handle = gateway
            .submit("test", &json!({ "payload": { "prompt": "hello" }, "priority": 4 }))
            .unwrap();
        assert_eq!(handle.priority(), Priority::new(4));

        assert_eq!(handle.await.unwrap().completion, "echo: hello");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_submission_never_queued() {
        let client = Arc::new(MockLlmClient::succeeding());
        let gateway = gateway(client.clone());

        let err = gateway
            .submit(
                "test",
                &json!({ "payload": { "prompt": "", "temperature": 1.5, "maxTokens": -1 } }),
            )
            .unwrap_err();

        match err {
            SubmitError::Invalid(e) => assert_eq!(e.errors.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(gateway.coordinator().stats().total_submitted, 0);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_before_validation() {
        let client = Arc::new(MockLlmClient::succeeding());
        let gateway = gateway(client).with_throttle(AdmissionThrottle::per_minute(1));

        gateway.submit("test", &json!({ "payload": { "prompt": "one" } })).unwrap();

        let err = gateway.submit("test", &json!({ "payload": {} })).unwrap_err();
        assert!(matches!(err, SubmitError::Throttled { .. }));
        assert_eq!(err.http_status(), 429);
        assert_eq!(gateway.coordinator().stats().total_submitted, 1);

        // Another caller has its own window
        assert!(gateway.submit("other", &json!({ "payload": { "prompt": "two" } })).is_ok());
    }
}
