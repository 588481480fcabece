//! Outbound-send rate limiting using the token bucket algorithm
//!
//! # Token Bucket Algorithm
//!
//! - Tokens are added to the bucket at a constant rate (`refill_rate`)
//! - Each send attempt consumes one token
//! - If no tokens are available, the cycle is skipped
//! - Bucket has maximum capacity (allows bursts)
//!
//! Refill is lazy: it happens on `acquire`, as a pure function of elapsed
//! wall-clock time, so there is no background timer and tests can drive the
//! bucket by rewinding `last_refill`. Each scheduler instance owns its own
//! bucket, so the configured limit applies per running instance.

use std::time::Instant;

/// Token bucket bounding send attempts per unit time
#[derive(Debug)]
pub struct TokenBucket {
    /// Current number of tokens
    tokens: f64,
    /// Maximum tokens (burst size)
    capacity: f64,
    /// Tokens added per second (fractional allowed)
    refill_rate: f64,
    /// Last time tokens were added
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a new token bucket, starting full
    #[must_use]
    pub fn new(capacity: f64, refill_rate_per_second: f64) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill_rate: refill_rate_per_second,
            last_refill: Instant::now(),
        }
    }

    /// Bucket sized for a per-minute send budget: burst up to the full
    /// minute's allowance, sustained at `limit / 60` per second.
    #[must_use]
    pub fn per_minute(limit: u32) -> Self {
        let capacity = f64::from(limit);
        Self::new(capacity, capacity / 60.0)
    }

    /// Refill tokens based on elapsed time.
    ///
    /// When the computed addition is not positive (zero elapsed time, or a
    /// clock anomaly) nothing happens, including the `last_refill` stamp:
    /// updating it would silently discard accrual still owed for this
    /// interval.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();

        let tokens_to_add = elapsed * self.refill_rate;
        if tokens_to_add <= 0.0 {
            return;
        }

        self.tokens = (self.tokens + tokens_to_add).min(self.capacity);
        self.last_refill = now;
    }

    /// Try to consume one token, returns true if successful.
    ///
    /// A refused acquisition does not mutate the balance, so fractional
    /// accrual keeps compounding across calls.
    pub fn acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current balance without triggering a refill (may be stale)
    #[must_use]
    pub const fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Maximum capacity (burst size)
    #[must_use]
    pub const fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Refill to capacity and restart the refill clock
    pub fn reset(&mut self) {
        self.tokens = self.capacity;
        self.last_refill = Instant::now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_starts_full_and_conserves_tokens() {
        let mut bucket = TokenBucket::new(10.0, 1.0);
        assert!((bucket.tokens() - 10.0).abs() < f64::EPSILON);

        // Exactly floor(initial) acquisitions succeed with no time advance
        for _ in 0..10 {
            assert!(bucket.acquire());
        }
        assert!(!bucket.acquire());
        assert!(bucket.tokens() >= 0.0, "balance must never go negative");

        // Refusal does not mutate the balance
        let before = bucket.tokens();
        assert!(!bucket.acquire());
        assert!((bucket.tokens() - before).abs() < f64::EPSILON);
    }

    #[test]
    fn test_refill_after_drain() {
        let mut bucket = TokenBucket::new(10.0, 1.0);
        for _ in 0..10 {
            assert!(bucket.acquire());
        }
        assert!(!bucket.acquire());

        // Simulate 2 seconds passing at 1 token/sec
        bucket.last_refill = Instant::now().checked_sub(Duration::from_secs(2)).unwrap();
        assert!(bucket.acquire());

        // 2 accrued, 1 consumed
        assert!(bucket.tokens() >= 0.9 && bucket.tokens() <= 1.1);
    }

    #[test]
    fn test_refill_caps_at_capacity() {
        let mut bucket = TokenBucket::new(5.0, 10.0);
        bucket.last_refill = Instant::now()
            .checked_sub(Duration::from_secs(3600))
            .unwrap();

        assert!(bucket.acquire());
        assert!(bucket.tokens() <= 4.1, "refill must not exceed capacity");
    }

    #[test]
    fn test_fractional_accrual_compounds() {
        let mut bucket = TokenBucket::new(10.0, 0.5);
        for _ in 0..10 {
            bucket.acquire();
        }
        assert!(!bucket.acquire());

        // Half a token accrued: still refused, but retained
        bucket.last_refill = Instant::now().checked_sub(Duration::from_secs(1)).unwrap();
        assert!(!bucket.acquire());
        assert!(bucket.tokens() >= 0.4);

        // Another second of accrual tips the balance over 1.0
        bucket.last_refill = Instant::now().checked_sub(Duration::from_secs(1)).unwrap();
        assert!(bucket.acquire());
    }

    #[test]
    fn test_peek_does_not_refill() {
        let mut bucket = TokenBucket::new(10.0, 1.0);
        for _ in 0..10 {
            bucket.acquire();
        }

        bucket.last_refill = Instant::now().checked_sub(Duration::from_secs(5)).unwrap();
        assert!(bucket.tokens() < 1.0, "peek must not trigger a refill");
        assert!(bucket.acquire(), "acquire still sees the accrued tokens");
    }

    #[test]
    fn test_reset_idempotence() {
        let mut bucket = TokenBucket::new(10.0, 1.0);
        for _ in 0..7 {
            bucket.acquire();
        }

        bucket.reset();
        assert!((bucket.tokens() - 10.0).abs() < f64::EPSILON);

        bucket.reset();
        assert!((bucket.tokens() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_per_minute_sizing() {
        let bucket = TokenBucket::per_minute(30);
        assert!((bucket.capacity() - 30.0).abs() < f64::EPSILON);
        assert!((bucket.refill_rate - 0.5).abs() < f64::EPSILON);
    }
}
