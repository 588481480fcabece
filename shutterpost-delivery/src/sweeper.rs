//! Daily retention sweep over the delivery audit log
//!
//! Waits until the next occurrence of a fixed local wall-clock hour
//! (default 03:00), then repeats on a 24-hour cadence. Each run deletes log
//! entries older than the retention window and records its own action as a
//! synthetic log entry so the sweep shows up in the same audit trail it
//! prunes. Failures are logged and swallowed; the next run retries
//! naturally.

use std::{sync::Arc, time::Duration};

use chrono::{Local, NaiveDateTime};
use serde_json::json;
use shutterpost_store::{
    DeliveryJobId, DeliveryLogEntry, DeliveryLogId, DeliveryMethod, LogOutcome, RecordStore,
    now_millis,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{config::MaintenanceConfig, error::DeliveryError};

const MILLIS_PER_DAY: u64 = 86_400_000;

/// Periodic pruning of historical log records
#[derive(Debug)]
pub struct LogSweeper {
    store: Arc<dyn RecordStore>,
    retention_days: u32,
    cleanup_hour: u32,
    handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl LogSweeper {
    /// Create an unscheduled sweeper
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, config: &MaintenanceConfig) -> Self {
        Self {
            store,
            retention_days: config.log_retention_days,
            cleanup_hour: config.cleanup_hour.min(23),
            handle: parking_lot::Mutex::new(None),
        }
    }

    /// Arm the daily sweep. Idempotent: a live schedule is left alone.
    pub fn schedule(&self) {
        let mut handle = self.handle.lock();
        if handle.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Log cleanup already scheduled");
            return;
        }

        let delay = delay_until(next_run_from(Local::now().naive_local(), self.cleanup_hour));
        info!(
            first_run_in_secs = delay.as_secs(),
            retention_days = self.retention_days,
            "Scheduling daily log cleanup"
        );

        let store = Arc::clone(&self.store);
        let retention_days = self.retention_days;
        *handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            loop {
                match cleanup(store.as_ref(), retention_days).await {
                    Ok(removed) => {
                        info!(removed, retention_days, "Log cleanup complete");
                    }
                    Err(e) => {
                        warn!("Log cleanup failed, will retry tomorrow: {e}");
                    }
                }
                tokio::time::sleep(Duration::from_secs(86_400)).await;
            }
        }));
    }

    /// Cancel the pending sweep. Safe to call when never scheduled.
    pub fn stop(&self) {
        if let Some(task) = self.handle.lock().take() {
            task.abort();
            info!("Log cleanup schedule cancelled");
        }
    }

    /// Whether a sweep is currently scheduled
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Delete log entries older than `days` now, outside the schedule.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_old_logs(&self, days: u32) -> Result<usize, DeliveryError> {
        cleanup(self.store.as_ref(), days).await
    }
}

impl Drop for LogSweeper {
    fn drop(&mut self) {
        if let Some(task) = self.handle.lock().take() {
            task.abort();
        }
    }
}

/// One sweep: bulk-delete expired entries, then append the synthetic
/// maintenance record describing what happened.
async fn cleanup(store: &dyn RecordStore, retention_days: u32) -> Result<usize, DeliveryError> {
    let now = now_millis();
    let cutoff = now.saturating_sub(u64::from(retention_days) * MILLIS_PER_DAY);
    let removed = store.delete_logs_older_than(cutoff).await?;

    store
        .append_log(DeliveryLogEntry {
            id: DeliveryLogId::generate(),
            delivery_id: DeliveryJobId::generate(),
            session_id: String::new(),
            customer_id: String::new(),
            method: DeliveryMethod::Maintenance,
            outcome: LogOutcome::Cleanup,
            attempt: 0,
            created_at: now,
            provider: "maintenance".to_string(),
            response_code: None,
            processing_time_ms: 0,
            response_data: Some(json!({
                "deleted": removed,
                "retentionDays": retention_days,
            })),
        })
        .await?;

    Ok(removed)
}

/// Next occurrence of `hour:00:00` at or after `now`, in naive local time.
fn next_run_from(now: NaiveDateTime, hour: u32) -> NaiveDateTime {
    // hour is clamped to 0..=23, so the wall-clock time always exists
    let Some(today_run) = now.date().and_hms_opt(hour.min(23), 0, 0) else {
        return now + chrono::Duration::days(1);
    };

    if today_run > now {
        today_run
    } else {
        today_run + chrono::Duration::days(1)
    }
}

/// Wall-clock wait from now until `target`; zero if already past.
fn delay_until(target: NaiveDateTime) -> Duration {
    (target - Local::now().naive_local())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 30)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        let next = next_run_from(at(1, 30), 3);
        assert_eq!(next, at(3, 0));
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let next = next_run_from(at(3, 0), 3);
        assert_eq!(next, at(3, 0) + chrono::Duration::days(1));

        let next = next_run_from(at(22, 15), 3);
        assert_eq!(next, at(3, 0) + chrono::Duration::days(1));
    }

    #[test]
    fn test_next_run_hour_zero() {
        let next = next_run_from(at(12, 0), 0);
        assert_eq!(next.hour(), 0);
        assert_eq!(next, at(0, 0) + chrono::Duration::days(1));
    }
}
