//! Drift retry policy.
//!
//! The resync step is named here so the retry budget and backoff can be
//! tuned without touching the submission loop.

use std::time::Duration;

use faucet_types::constants;

/// How the sequencer reacts to a sequence drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first drift-failed one.
    pub max_drift_retries: u32,
    /// Pause before the n-th resync is `backoff * n`. Zero disables it.
    pub backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_drift_retries: u32, backoff: Duration) -> Self {
        Self {
            max_drift_retries,
            backoff,
        }
    }

    /// Total broadcasts a single transfer may use.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_drift_retries.saturating_add(1)
    }

    /// Whether another attempt is allowed after `attempts` have drifted.
    #[must_use]
    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts()
    }

    /// Delay before the resync that follows drifted attempt `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    /// Wait out the backoff for `attempt`, if any.
    pub async fn pause(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_drift_retries: constants::MAX_DRIFT_RETRIES,
            backoff: Duration::ZERO,
        }
    }
}
