//! Queue types for the coordinator

use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::error::DispatchError;
use crate::domain::{Priority, RequestId};
use crate::llm::{CompletionRequest, CompletionResponse};

/// Sending half of a completion handle
pub(crate) type Completion = oneshot::Sender<Result<CompletionResponse, DispatchError>>;

/// A queued request
///
/// Owned by the queue until dequeued, then by the dispatcher until its
/// completion is sent.
#[derive(Debug)]
pub(crate) struct WorkItem {
    pub id: RequestId,
    pub payload: CompletionRequest,
    pub priority: Priority,
    pub enqueued_at: Instant,
    /// Insertion sequence number; breaks priority ties first-in-first-out
    pub seq: u64,
    pub completion: Completion,
}

impl Eq for WorkItem {}

impl PartialEq for WorkItem {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Ord for WorkItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Higher priority first, then earlier insertion
        self.priority.cmp(&other.priority).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for WorkItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Whether the dispatcher loop is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatcherState {
    /// Queue empty, no loop running
    #[default]
    Idle,
    /// One request in flight or pacing before the next
    Processing,
}

impl std::fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Processing => write!(f, "processing"),
        }
    }
}

/// Running totals for the coordinator
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    pub total_submitted: u64,
    pub total_succeeded: u64,
    pub total_failed: u64,
    pub total_retries: u64,
    pub total_wait_time_ms: u64,
    pub peak_queue_depth: usize,
}

impl CoordinatorStats {
    pub fn total_completed(&self) -> u64 {
        self.total_succeeded + self.total_failed
    }

    /// Mean time requests spent queued before dispatch
    pub fn average_wait(&self) -> Option<Duration> {
        let completed = self.total_completed();
        (completed > 0).then(|| Duration::from_millis(self.total_wait_time_ms / completed))
    }
}

/// Point-in-time view of the coordinator
#[derive(Debug, Clone, Serialize)]
pub struct QueueState {
    pub state: DispatcherState,
    pub queued: usize,
    pub stats: CoordinatorStats,
}
