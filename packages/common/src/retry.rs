use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

/// A single failed attempt of a queued job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAttempt {
    /// 1-based attempt number.
    pub attempt: u8,
    /// Error message from the failed attempt.
    pub error: String,
    /// When this attempt occurred.
    pub timestamp: DateTime<Utc>,
}

impl RetryAttempt {
    pub fn new(attempt: u8, error: impl Into<String>) -> Self {
        Self {
            attempt,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of recording a failure.
#[derive(Debug, Clone)]
pub enum RetryDecision {
    Retry {
        attempt: u8,
        history: Vec<RetryAttempt>,
    },
    Exhausted {
        history: Vec<RetryAttempt>,
    },
}

#[derive(Debug, Clone)]
struct RetryState {
    attempt: u8,
    history: Vec<RetryAttempt>,
    last_updated: Instant,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: 0,
            history: Vec::new(),
            last_updated: Instant::now(),
        }
    }
}

/// In-memory retry bookkeeping for queued jobs, keyed by job id.
#[derive(Debug, Default)]
pub struct RetryTracker {
    state: HashMap<String, RetryState>,
    max_retries: u8,
}

impl RetryTracker {
    pub fn new(max_retries: u8) -> Self {
        Self {
            state: HashMap::new(),
            max_retries,
        }
    }

    /// Record a failure for the given job id.
    pub fn record_failure(&mut self, id: &str, error: &str) -> RetryDecision {
        let retry_state = self
            .state
            .entry(id.to_string())
            .or_insert_with(RetryState::new);

        retry_state.attempt += 1;
        retry_state.last_updated = Instant::now();
        retry_state
            .history
            .push(RetryAttempt::new(retry_state.attempt, error));

        if retry_state.attempt <= self.max_retries {
            RetryDecision::Retry {
                attempt: retry_state.attempt,
                history: retry_state.history.clone(),
            }
        } else {
            let final_history = retry_state.history.clone();
            self.state.remove(id);
            RetryDecision::Exhausted {
                history: final_history,
            }
        }
    }

    /// Clear retry state for a job that succeeded or was given up on.
    pub fn clear(&mut self, id: &str) {
        self.state.remove(id);
    }

    /// Drop entries that have not been updated within `max_age`.
    pub fn cleanup_stale(&mut self, max_age: Duration) {
        let now = Instant::now();
        self.state
            .retain(|_, state| now.duration_since(state.last_updated) < max_age);
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

/// Exponential backoff with jitter: `min(base_ms * 2^(attempt-1) + jitter, max_ms)`
/// where jitter is 0-25% of the exponential delay.
pub fn calculate_backoff(attempt: u8, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow((attempt - 1) as u32);
    let delay_ms = base_ms.saturating_mul(exp_factor);

    let jitter = if delay_ms > 0 {
        rand::rng().random_range(0..=delay_ms / 4)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter).min(max_ms))
}

/// Periodically evicts stale tracker entries (jobs whose consumer died
/// between attempts would otherwise leak).
pub fn spawn_cleanup_task(
    tracker: Arc<Mutex<RetryTracker>>,
    cleanup_interval: Duration,
    max_age: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);

        loop {
            interval.tick().await;
            let removed = {
                let mut guard = tracker.lock().await;
                let before = guard.len();
                guard.cleanup_stale(max_age);
                before - guard.len()
            };
            if removed > 0 {
                info!(removed, "Cleaned up stale retry tracker entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_then_exhausts() {
        let mut tracker = RetryTracker::new(2);

        match tracker.record_failure("job-1", "boom") {
            RetryDecision::Retry { attempt, .. } => assert_eq!(attempt, 1),
            other => panic!("expected retry, got {other:?}"),
        }
        match tracker.record_failure("job-1", "boom again") {
            RetryDecision::Retry { attempt, .. } => assert_eq!(attempt, 2),
            other => panic!("expected retry, got {other:?}"),
        }
        match tracker.record_failure("job-1", "final") {
            RetryDecision::Exhausted { history } => {
                assert_eq!(history.len(), 3);
                assert_eq!(history[2].error, "final");
            }
            other => panic!("expected exhausted, got {other:?}"),
        }

        // Exhaustion removes the entry; the next failure starts fresh.
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut tracker = RetryTracker::new(3);
        tracker.record_failure("job-2", "x");
        tracker.clear("job-2");
        match tracker.record_failure("job-2", "y") {
            RetryDecision::Retry { attempt, .. } => assert_eq!(attempt, 1),
            other => panic!("expected retry, got {other:?}"),
        }
    }

    #[test]
    fn test_backoff_bounds() {
        assert_eq!(calculate_backoff(0, 100, 10_000), Duration::ZERO);

        let d1 = calculate_backoff(1, 100, 10_000);
        assert!(d1 >= Duration::from_millis(100) && d1 <= Duration::from_millis(125));

        // Capped at max_ms regardless of attempt.
        let capped = calculate_backoff(30, 100, 500);
        assert_eq!(capped, Duration::from_millis(500));
    }
}
