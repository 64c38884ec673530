//! Retry with exponential backoff around a single-attempt client

use std::time::Duration;

use tracing::{debug, warn};

use super::config::CoordinatorConfig;
use super::error::DispatchError;
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};

/// Delay before the first retry; doubles on each subsequent one
pub const BASE_BACKOFF: Duration = Duration::from_millis(1000);

/// Classification of one transport attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Retryable,
    Terminal,
}

/// Record of one transport call for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 0-based
    pub attempt_number: u32,
    pub outcome: AttemptOutcome,
    pub http_status: Option<u16>,
}

impl Attempt {
    fn classify(attempt_number: u32, result: &Result<CompletionResponse, LlmError>) -> Self {
        let (outcome, http_status) = match result {
            Ok(_) => (AttemptOutcome::Success, None),
            Err(e) if e.is_retryable() => (AttemptOutcome::Retryable, e.status()),
            Err(e) => (AttemptOutcome::Terminal, e.status()),
        };
        Self {
            attempt_number,
            outcome,
            http_status,
        }
    }
}

/// Result of running a request through the policy
#[derive(Debug)]
pub struct Delivery {
    pub attempts: Vec<Attempt>,
    pub result: Result<CompletionResponse, DispatchError>,
}

impl Delivery {
    /// Retries performed (attempts beyond the first)
    pub fn retries(&self) -> u32 {
        self.attempts.len().saturating_sub(1) as u32
    }
}

/// Retry policy
///
/// Holds no per-request state: the attempt counter lives inside
/// [`RetryPolicy::execute`] for the duration of one request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: BASE_BACKOFF,
        }
    }

    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self::new(config.max_retries())
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay after a failed attempt: `base * 2^attempt_number`
    pub fn backoff(&self, attempt_number: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt_number))
    }

    /// Deliver a request, retrying 429 and 5xx failures until the budget runs out
    pub async fn execute(&self, client: &dyn LlmClient, request: &CompletionRequest) -> Delivery {
        debug!(max_retries = self.max_retries, "RetryPolicy::execute: called");
        let mut attempts = Vec::new();
        let mut attempt_number = 0u32;

        loop {
            let result = client.complete(request).await;
            attempts.push(Attempt::classify(attempt_number, &result));

            match result {
                Ok(response) => {
                    debug!(attempt = attempt_number, "RetryPolicy::execute: success");
                    return Delivery {
                        attempts,
                        result: Ok(response),
                    };
                }
                Err(err) if err.is_retryable() && attempt_number < self.max_retries => {
                    let delay = self.backoff(attempt_number);
                    warn!(
                        attempt = attempt_number,
                        status = ?err.status(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt_number += 1;
                }
                Err(err) => {
                    // A retryable failure with no budget left ends the request
                    if let Some(last) = attempts.last_mut() {
                        last.outcome = AttemptOutcome::Terminal;
                    }
                    debug!(
                        attempt = attempt_number,
                        retryable = err.is_retryable(),
                        "RetryPolicy::execute: terminal failure"
                    );
                    return Delivery {
                        attempts,
                        result: Err(DispatchError::Transport {
                            attempts: attempt_number + 1,
                            source: err,
                        }),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use tokio::time::Instant;

    fn unavailable() -> Result<CompletionResponse, LlmError> {
        Err(LlmError::ApiError {
            status: 503,
            code: None,
            message: "unavailable".to_string(),
        })
    }

    fn rate_limited() -> Result<CompletionResponse, LlmError> {
        Err(LlmError::RateLimited {
            code: None,
            message: "slow down".to_string(),
        })
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(5);
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::new(u32::MAX);
        assert!(policy.backoff(200) >= policy.backoff(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_attempt() {
        let client = MockLlmClient::succeeding();
        let delivery = RetryPolicy::new(3).execute(&client, &CompletionRequest::new("hi")).await;

        assert_eq!(delivery.retries(), 0);
        assert_eq!(delivery.result.as_ref().unwrap().completion, "echo: hi");
        assert_eq!(
            delivery.attempts,
            vec![Attempt {
                attempt_number: 0,
                outcome: AttemptOutcome::Success,
                http_status: None
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_with_exponential_delays() {
        let max_retries = 3;
        let client = MockLlmClient::new((0..=max_retries).map(|_| unavailable()).collect());

        let delivery = RetryPolicy::new(max_retries)
            .execute(&client, &CompletionRequest::new("hi"))
            .await;

        assert_eq!(client.call_count(), 4);
        let err = delivery.result.unwrap_err();
        assert_eq!(err.attempts(), 4);
        assert_eq!(err.status(), Some(503));
        let outcomes: Vec<_> = delivery.attempts.iter().map(|a| a.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                AttemptOutcome::Retryable,
                AttemptOutcome::Retryable,
                AttemptOutcome::Retryable,
                AttemptOutcome::Terminal
            ]
        );
        assert_eq!(delivery.attempts[3].http_status, Some(503));

        let times = client.call_times();
        let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
        for (gap, expected) in gaps.iter().zip([1u64, 2, 4]) {
            let expected = Duration::from_secs(expected);
            assert!(
                *gap >= expected && *gap < expected + Duration::from_millis(10),
                "gap {gap:?} expected {expected:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_rate_limit() {
        let client = MockLlmClient::new(vec![rate_limited(), unavailable()]);
        let start = Instant::now();

        let delivery = RetryPolicy::new(3).execute(&client, &CompletionRequest::new("hi")).await;

        assert!(delivery.result.is_ok());
        assert_eq!(delivery.retries(), 2);
        assert_eq!(delivery.attempts[0].http_status, Some(429));
        assert_eq!(delivery.attempts[2].outcome, AttemptOutcome::Success);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_not_retried() {
        let client = MockLlmClient::new(vec![Err(LlmError::ApiError {
            status: 400,
            code: Some("invalid_request_error".to_string()),
            message: "bad prompt".to_string(),
        })]);
        let start = Instant::now();

        let delivery = RetryPolicy::new(3).execute(&client, &CompletionRequest::new("hi")).await;

        assert_eq!(client.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        let err = delivery.result.unwrap_err();
        assert_eq!(err.code(), "invalid_request_error");
        assert_eq!(err.attempts(), 1);
        assert_eq!(delivery.attempts[0].outcome, AttemptOutcome::Terminal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_single_attempt() {
        let client = MockLlmClient::new(vec![unavailable()]);

        let delivery = RetryPolicy::new(0).execute(&client, &CompletionRequest::new("hi")).await;

        assert_eq!(client.call_count(), 1);
        assert_eq!(delivery.attempts[0].outcome, AttemptOutcome::Terminal);
        assert_eq!(delivery.result.unwrap_err().attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_base_delay() {
        let client = MockLlmClient::new(vec![unavailable()]);
        let start = Instant::now();

        let delivery = RetryPolicy::new(1)
            .with_base_delay(Duration::from_millis(10))
            .execute(&client, &CompletionRequest::new("hi"))
            .await;

        assert!(delivery.result.is_ok());
        assert!(start.elapsed() >= Duration::from_millis(10));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
