//! Coordinator implementation: priority queue plus single-flight dispatcher

use std::collections::BinaryHeap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::config::CoordinatorConfig;
use super::error::DispatchError;
use super::handle::CompletionHandle;
use super::queue::{CoordinatorStats, DispatcherState, QueueState, WorkItem};
use super::retry::RetryPolicy;
use crate::domain::{Priority, RequestId};
use crate::llm::{CompletionRequest, HttpClient, LlmClient, LlmError};

/// Queue and dispatcher state, guarded by one lock
struct CoordinatorInner {
    /// Pending requests, highest priority at the top
    queue: BinaryHeap<WorkItem>,

    state: DispatcherState,

    /// Next insertion sequence number
    next_seq: u64,

    stats: CoordinatorStats,
}

struct Shared {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    pacing: Duration,
    inner: Mutex<CoordinatorInner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CoordinatorInner> {
        // Every critical section leaves the queue consistent, so a poisoned
        // lock is still safe to use.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The Coordinator orders requests by priority and dispatches them one at a
/// time, pausing for the pacing interval after each completion.
///
/// Cloning is cheap; clones share the same queue and dispatcher.
#[derive(Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    /// Create a coordinator from validated configuration and a transport client
    pub fn new(config: &CoordinatorConfig, client: Arc<dyn LlmClient>) -> Self {
        debug!(?config, "Coordinator::new: called");
        Self::with_policy(client, RetryPolicy::from_config(config), config.pacing_interval())
    }

    /// Create a coordinator that talks to the configured HTTP endpoint
    pub fn connect(config: &CoordinatorConfig) -> Result<Self, LlmError> {
        let client = HttpClient::from_config(config)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Create a coordinator with an explicit retry policy and pacing interval
    pub fn with_policy(client: Arc<dyn LlmClient>, retry: RetryPolicy, pacing: Duration) -> Self {
        debug!(?retry, ?pacing, "Coordinator::with_policy: called");
        Self {
            shared: Arc::new(Shared {
                client,
                retry,
                pacing,
                inner: Mutex::new(CoordinatorInner {
                    queue: BinaryHeap::new(),
                    state: DispatcherState::Idle,
                    next_seq: 0,
                    stats: CoordinatorStats::default(),
                }),
            }),
        }
    }

    /// Queue a request and return its completion handle without waiting
    ///
    /// Starts the dispatcher if it is idle. Must be called from within a
    /// Tokio runtime. Payload validation is the caller's job; see
    /// [`crate::coordinator::Gateway`].
    pub fn submit(&self, payload: CompletionRequest, priority: Priority) -> CompletionHandle {
        let id = RequestId::generate();
        let (tx, rx) = oneshot::channel();

        let (start_dispatcher, queued) = {
            let mut inner = self.shared.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;

            inner.queue.push(WorkItem {
                id: id.clone(),
                payload,
                priority,
                enqueued_at: Instant::now(),
                seq,
                completion: tx,
            });

            inner.stats.total_submitted += 1;
            inner.stats.peak_queue_depth = inner.stats.peak_queue_depth.max(inner.queue.len());

            let start = inner.state == DispatcherState::Idle;
            if start {
                inner.state = DispatcherState::Processing;
            }
            (start, inner.queue.len())
        };

        info!(request_id = %id, %priority, queued, "Request queued");

        if start_dispatcher {
            debug!("Coordinator::submit: dispatcher idle, starting");
            tokio::spawn(dispatch_loop(self.shared.clone()));
        }

        CompletionHandle::new(id, priority, rx)
    }

    pub fn state(&self) -> DispatcherState {
        self.shared.lock().state
    }

    /// Number of requests waiting (excludes the one in flight)
    pub fn queue_len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.shared.lock().stats.clone()
    }

    /// Current state, queue depth, and statistics in one snapshot
    pub fn queue_state(&self) -> QueueState {
        let inner = self.shared.lock();
        QueueState {
            state: inner.state,
            queued: inner.queue.len(),
            stats: inner.stats.clone(),
        }
    }

    /// Pause enforced after each completion
    pub fn pacing_interval(&self) -> Duration {
        self.shared.pacing
    }
}

/// Drain the queue one request at a time until it is empty
async fn dispatch_loop(shared: Arc<Shared>) {
    info!("Dispatcher started");

    loop {
        let item = {
            let mut inner = shared.lock();
            match inner.queue.pop() {
                Some(item) => item,
                None => {
                    inner.state = DispatcherState::Idle;
                    break;
                }
            }
        };

        process(&shared, item).await;

        debug!(pacing_ms = shared.pacing.as_millis() as u64, "dispatch_loop: pacing");
        tokio::time::sleep(shared.pacing).await;
    }

    info!("Dispatcher idle");
}

/// Run one request through the retry policy and resolve its handle
async fn process(shared: &Shared, item: WorkItem) {
    let WorkItem {
        id,
        payload,
        priority,
        enqueued_at,
        completion,
        ..
    } = item;

    let wait_time = enqueued_at.elapsed();
    info!(request_id = %id, %priority, wait_ms = wait_time.as_millis() as u64, "Processing request");

    let outcome = AssertUnwindSafe(shared.retry.execute(shared.client.as_ref(), &payload))
        .catch_unwind()
        .await;

    let (result, retries) = match outcome {
        Ok(delivery) => {
            let retries = delivery.retries();
            (delivery.result, retries)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(request_id = %id, %message, "Request processing panicked");
            (Err(DispatchError::Internal(message)), 0)
        }
    };

    {
        let mut inner = shared.lock();
        inner.stats.total_retries += u64::from(retries);
        inner.stats.total_wait_time_ms += wait_time.as_millis() as u64;
        if result.is_ok() {
            inner.stats.total_succeeded += 1;
        } else {
            inner.stats.total_failed += 1;
        }
    }

    match &result {
        Ok(_) => info!(request_id = %id, retries, "Request completed"),
        Err(e) => error!(request_id = %id, code = e.code(), status = ?e.status(), error = %e, "Request failed"),
    }

    if completion.send(result).is_err() {
        debug!(request_id = %id, "process: caller dropped the completion handle");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
