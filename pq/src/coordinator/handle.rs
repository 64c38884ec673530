//! CompletionHandle - the caller's side of a queued request

use std::future::IntoFuture;

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::debug;

use super::error::DispatchError;
use crate::domain::{Priority, RequestId};
use crate::llm::CompletionResponse;

/// Resolves exactly once with the request's outcome
///
/// Dropping the handle does not cancel the request; the dispatcher still
/// processes it and discards the result.
#[derive(Debug)]
pub struct CompletionHandle {
    id: RequestId,
    priority: Priority,
    rx: oneshot::Receiver<Result<CompletionResponse, DispatchError>>,
}

impl CompletionHandle {
    pub(crate) fn new(
        id: RequestId,
        priority: Priority,
        rx: oneshot::Receiver<Result<CompletionResponse, DispatchError>>,
    ) -> Self {
        Self { id, priority, rx }
    }

    /// ID assigned at enqueue time
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Wait for the request to finish
    pub async fn wait(self) -> Result<CompletionResponse, DispatchError> {
        debug!(request_id = %self.id, "CompletionHandle::wait: called");
        self.rx.await.unwrap_or_else(|_| {
            debug!(request_id = %self.id, "CompletionHandle::wait: sender dropped");
            Err(DispatchError::Shutdown)
        })
    }
}

impl IntoFuture for CompletionHandle {
    type Output = Result<CompletionResponse, DispatchError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_resolves_with_sent_value() {
        let (tx, rx) = oneshot::channel();
        let handle = CompletionHandle::new(RequestId::from("abc123-req-1"), Priority::new(3), rx);

        assert_eq!(handle.id().as_str(), "abc123-req-1");
        assert_eq!(handle.priority(), Priority::new(3));

        tx.send(Ok(CompletionResponse {
            id: "cmpl-1".to_string(),
            ..Default::default()
        }))
        .unwrap();

        assert_eq!(handle.await.unwrap().id, "cmpl-1");
    }

    #[tokio::test]
    async fn test_dropped_sender_is_shutdown() {
        let (tx, rx) = oneshot::channel();
        let handle = CompletionHandle::new(RequestId::generate(), Priority::default(), rx);
        drop(tx);

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, DispatchError::Shutdown));
    }
}
