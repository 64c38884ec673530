//! Sliding-window throttle for inbound submissions

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Per-caller submission limiter
///
/// Allows at most `limit` submissions per caller within any `window`.
/// Independent of the dispatcher's pacing, which governs outbound calls.
#[derive(Debug)]
pub struct AdmissionThrottle {
    counters: HashMap<String, VecDeque<Instant>>,
    limit: usize,
    window: Duration,
}

impl AdmissionThrottle {
    pub fn new(limit: usize, window: Duration) -> Self {
        debug!(limit, ?window, "AdmissionThrottle::new: called");
        Self {
            counters: HashMap::new(),
            limit,
            window,
        }
    }

    /// Limit per one-minute window
    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Record a submission, or return how long until one would be admitted
    pub fn check_and_record(&mut self, caller: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let counter = self.counters.entry(caller.to_string()).or_default();

        // Remove timestamps outside window
        while let Some(&timestamp) = counter.front() {
            if now.duration_since(timestamp) >= self.window {
                counter.pop_front();
            } else {
                break;
            }
        }

        if counter.len() < self.limit {
            counter.push_back(now);
            return Ok(());
        }

        let retry_after = counter
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.window);
        debug!(%caller, ?retry_after, "AdmissionThrottle::check_and_record: over limit");
        Err(retry_after)
    }

    /// Forget a caller's history
    pub fn clear(&mut self, caller: &str) {
        self.counters.remove(caller);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_limit_within_window() {
        let mut throttle = AdmissionThrottle::per_minute(3);

        assert!(throttle.check_and_record("a").is_ok());
        assert!(throttle.check_and_record("a").is_ok());
        assert!(throttle.check_and_record("a").is_ok());

        let retry_after = throttle.check_and_record("a").unwrap_err();
        assert_eq!(retry_after, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_callers_independent() {
        let mut throttle = AdmissionThrottle::per_minute(1);

        assert!(throttle.check_and_record("a").is_ok());
        assert!(throttle.check_and_record("b").is_ok());
        assert!(throttle.check_and_record("a").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let mut throttle = AdmissionThrottle::new(2, Duration::from_secs(10));

        assert!(throttle.check_and_record("a").is_ok());
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(throttle.check_and_record("a").is_ok());

        assert_eq!(throttle.check_and_record("a").unwrap_err(), Duration::from_secs(6));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(throttle.check_and_record("a").is_ok());
        assert!(throttle.check_and_record("a").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear() {
        let mut throttle = AdmissionThrottle::per_minute(1);
        assert!(throttle.check_and_record("a").is_ok());
        throttle.clear("a");
        assert!(throttle.check_and_record("a").is_ok());
    }
}
