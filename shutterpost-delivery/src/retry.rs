//! Retry policy for delivery attempts.
//!
//! Encapsulates the attempt budget and the progressive backoff schedule so
//! retry behavior can be reasoned about and tested independently of the
//! processor.

use serde::{Deserialize, Serialize};

const fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_secs() -> Vec<u64> {
    vec![1, 3, 9]
}

/// Retry policy configuration for delivery attempts.
///
/// The backoff schedule is a progressive table indexed by attempt number;
/// attempts past the end of the table pin to the last entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of delivery attempts before a job goes terminal.
    ///
    /// Default: 3 attempts
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay in seconds before retry N, for N = 1, 2, ...
    ///
    /// Default: `[1, 3, 9]`
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: Vec<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

impl RetryPolicy {
    /// Check if another attempt should be made after `attempt_count`
    /// attempts have completed.
    #[must_use]
    pub const fn should_retry(&self, attempt_count: u32) -> bool {
        attempt_count < self.max_attempts
    }

    /// Number of attempts remaining; `0` once the budget is exhausted.
    #[must_use]
    pub const fn remaining_attempts(&self, attempt_count: u32) -> u32 {
        self.max_attempts.saturating_sub(attempt_count)
    }

    /// Check if the next attempt would be the final one.
    #[must_use]
    pub const fn is_final_attempt(&self, attempt_count: u32) -> bool {
        attempt_count + 1 >= self.max_attempts
    }

    /// Backoff delay in seconds after the Nth failed attempt (1-indexed).
    ///
    /// Attempts beyond the schedule length are capped at the last entry.
    /// An empty schedule means immediate retry.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> u64 {
        if self.backoff_secs.is_empty() {
            return 0;
        }

        let index = usize::try_from(attempt.saturating_sub(1))
            .unwrap_or(usize::MAX)
            .min(self.backoff_secs.len() - 1);
        self.backoff_secs[index]
    }

    /// Unix-millis timestamp at which the job becomes eligible again after
    /// the Nth failed attempt.
    #[must_use]
    pub fn next_retry_at(&self, attempt: u32, now_ms: u64) -> u64 {
        now_ms.saturating_add(self.backoff_for(attempt).saturating_mul(1_000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff_secs, vec![1, 3, 9]);
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));

        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(100));
    }

    #[test]
    fn test_remaining_attempts() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.remaining_attempts(0), 3);
        assert_eq!(policy.remaining_attempts(2), 1);
        assert_eq!(policy.remaining_attempts(3), 0);
        assert_eq!(policy.remaining_attempts(10), 0); // Saturating
    }

    #[test]
    fn test_is_final_attempt() {
        let policy = RetryPolicy::default();

        assert!(!policy.is_final_attempt(0));
        assert!(!policy.is_final_attempt(1));
        assert!(policy.is_final_attempt(2));
        assert!(policy.is_final_attempt(3));
    }

    #[test]
    fn test_backoff_schedule_progression_and_cap() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff_for(1), 1);
        assert_eq!(policy.backoff_for(2), 3);
        assert_eq!(policy.backoff_for(3), 9);

        // Attempts past the schedule pin to the last entry
        assert_eq!(policy.backoff_for(4), 9);
        assert_eq!(policy.backoff_for(25), 9);
    }

    #[test]
    fn test_next_retry_at() {
        let policy = RetryPolicy::default();
        let now = 1_000_000;

        assert_eq!(policy.next_retry_at(1, now), now + 1_000);
        assert_eq!(policy.next_retry_at(2, now), now + 3_000);
        assert_eq!(policy.next_retry_at(3, now), now + 9_000);
        assert_eq!(policy.next_retry_at(9, now), now + 9_000);
    }

    #[test]
    fn test_empty_schedule_means_immediate_retry() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff_secs: Vec::new(),
        };

        assert_eq!(policy.backoff_for(1), 0);
        assert_eq!(policy.next_retry_at(2, 42), 42);
    }
}
