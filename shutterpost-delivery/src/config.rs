//! Engine configuration with serde defaults

use serde::{Deserialize, Serialize};

use crate::{rate_limiter::TokenBucket, retry::RetryPolicy};

const fn default_cycle_interval_ms() -> u64 {
    1_000
}

const fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_schedule_secs() -> Vec<u64> {
    vec![1, 3, 9]
}

const fn default_rate_limit_per_minute() -> u32 {
    30
}

const fn default_log_retention_days() -> u32 {
    90
}

const fn default_cleanup_hour() -> u32 {
    3
}

/// Configuration for the automation scheduler and processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Delay between processing cycles (in milliseconds)
    ///
    /// This is a delay between cycles, not a fixed rate: a slow cycle
    /// pushes the next one out rather than overlapping it.
    ///
    /// Default: 1000ms (1 second)
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Maximum number of delivery attempts before giving up
    ///
    /// Default: 3
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Progressive backoff schedule between attempts (in seconds);
    /// attempts past the end of the table pin to the last entry
    ///
    /// Default: `[1, 3, 9]`
    #[serde(default = "default_backoff_schedule_secs")]
    pub backoff_schedule_secs: Vec<u64>,

    /// Outbound send budget per minute, per scheduler instance
    ///
    /// Default: 30
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: default_cycle_interval_ms(),
            max_attempts: default_max_attempts(),
            backoff_schedule_secs: default_backoff_schedule_secs(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
        }
    }
}

impl AutomationConfig {
    /// Retry policy derived from this configuration
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_secs: self.backoff_schedule_secs.clone(),
        }
    }

    /// Token bucket sized for this configuration's send budget
    #[must_use]
    pub fn token_bucket(&self) -> TokenBucket {
        TokenBucket::per_minute(self.rate_limit_per_minute)
    }
}

/// Configuration for the log retention sweeper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Audit log retention window (in days)
    ///
    /// Default: 90
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,

    /// Local wall-clock hour (0-23) of the daily sweep
    ///
    /// Default: 3 (03:00)
    #[serde(default = "default_cleanup_hour")]
    pub cleanup_hour: u32,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            log_retention_days: default_log_retention_days(),
            cleanup_hour: default_cleanup_hour(),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}
