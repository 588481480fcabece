//! The automation scheduler: a cooperative, self-rescheduling loop
//!
//! One scheduler instance owns its token bucket and drives the processor on
//! a fixed delay between cycles. Cycles from the same instance never
//! overlap: the loop awaits each cycle before sleeping, and a single-flight
//! guard additionally refuses re-entry if the delay is misconfigured to
//! zero. Stopping is cooperative: an in-flight cycle finishes, no further
//! cycles are scheduled. No timeout is enforced on provider calls, so a
//! hung provider stalls this instance's loop until the call returns.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use serde::Serialize;
use shutterpost_store::{DeliveryStatus, RecordStore};
use tokio::{sync::Notify, task::JoinHandle};
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::AutomationConfig,
    error::DeliveryError,
    processor::{CycleOutcome, DeliveryProcessor},
    rate_limiter::TokenBucket,
};

/// Queue totals by status, for monitoring surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub processing: usize,
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
}

/// Read-only scheduler snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    /// Whether the loop is running
    pub enabled: bool,
    /// Whether a cycle is in flight right now
    pub processing: bool,
    pub queue_counts: QueueCounts,
    /// Tokens left in this instance's bucket (stale peek, no refill)
    pub rate_limit_tokens_remaining: f64,
}

#[derive(Debug)]
struct SchedulerInner {
    processor: DeliveryProcessor,
    store: Arc<dyn RecordStore>,
    bucket: parking_lot::Mutex<TokenBucket>,
    cycle_interval: Duration,
    enabled: AtomicBool,
    processing: AtomicBool,
    /// Bumped on every start; a loop exits once its captured generation
    /// goes stale, so a stop-then-start never leaves two loops running.
    generation: AtomicU64,
    wake: Notify,
}

impl SchedulerInner {
    /// One guarded cycle: single-flight check, rate-limit admission, then
    /// the processor. Never propagates an error into the loop.
    async fn run_once(&self) {
        // Single-flight: if a cycle is somehow still in flight, skip
        // rather than overlap it.
        if self.processing.swap(true, Ordering::SeqCst) {
            warn!("Previous delivery cycle still in flight, skipping");
            return;
        }

        if self.bucket.lock().acquire() {
            match self.processor.process_next().await {
                Ok(CycleOutcome::Idle) => trace!("Delivery queue empty"),
                Ok(CycleOutcome::ClaimLost) => {
                    debug!("Claim lost to another worker");
                }
                Ok(CycleOutcome::Processed { job_id, status }) => {
                    debug!(%job_id, %status, "Processed delivery job");
                }
                Err(e) => {
                    error!("Error processing delivery queue: {e}");
                }
            }
        } else {
            trace!("Rate limit exhausted, deferring cycle");
        }

        self.processing.store(false, Ordering::SeqCst);
    }
}

/// Start/stop lifecycle and loop for automated queue draining.
///
/// An explicit instance rather than process-global state, so independent
/// schedulers can coexist in one process and tests never leak flags into
/// each other.
#[derive(Debug)]
pub struct AutomationScheduler {
    inner: Arc<SchedulerInner>,
    handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl AutomationScheduler {
    /// Create a stopped scheduler over the given processor
    #[must_use]
    pub fn new(
        processor: DeliveryProcessor,
        store: Arc<dyn RecordStore>,
        config: &AutomationConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                processor,
                store,
                bucket: parking_lot::Mutex::new(config.token_bucket()),
                cycle_interval: Duration::from_millis(config.cycle_interval_ms),
                enabled: AtomicBool::new(false),
                processing: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                wake: Notify::new(),
            }),
            handle: parking_lot::Mutex::new(None),
        }
    }

    /// Start the loop. Idempotent: calling on a running scheduler does
    /// nothing. The first cycle runs immediately.
    pub fn start(&self) {
        if self.inner.enabled.swap(true, Ordering::SeqCst) {
            debug!("Automation already running");
            return;
        }

        info!(
            cycle_interval = ?self.inner.cycle_interval,
            "Starting delivery automation"
        );

        // A loop left over from a previous start may not have observed the
        // stop yet; the new generation makes it exit at its next check even
        // though enabled is true again.
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            loop {
                if !inner.enabled.load(Ordering::SeqCst)
                    || inner.generation.load(Ordering::SeqCst) != generation
                {
                    break;
                }

                inner.run_once().await;

                tokio::select! {
                    () = tokio::time::sleep(inner.cycle_interval) => {}
                    () = inner.wake.notified() => {}
                }
            }
            debug!("Automation loop exited");
        });

        *self.handle.lock() = Some(task);
    }

    /// Stop the loop. Idempotent and cooperative: any in-flight cycle
    /// finishes, but no further cycles are scheduled.
    pub fn stop(&self) {
        if !self.inner.enabled.swap(false, Ordering::SeqCst) {
            debug!("Automation already stopped");
            return;
        }

        info!("Stopping delivery automation");
        self.inner.wake.notify_waiters();
        // The task exits on its own at the next loop check; dropping the
        // handle detaches rather than aborts it.
        self.handle.lock().take();
    }

    /// Whether the loop is currently enabled
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Read-only snapshot for monitoring UIs
    pub async fn status(&self) -> Result<QueueStatus, DeliveryError> {
        let store = &self.inner.store;
        let pending = store.count_by_status(DeliveryStatus::Pending).await?;
        let processing = store.count_by_status(DeliveryStatus::Processing).await?;
        let sent = store.count_by_status(DeliveryStatus::Sent).await?;
        let failed = store.count_by_status(DeliveryStatus::Failed).await?;

        Ok(QueueStatus {
            enabled: self.inner.enabled.load(Ordering::SeqCst),
            processing: self.inner.processing.load(Ordering::SeqCst),
            queue_counts: QueueCounts {
                pending,
                processing,
                sent,
                failed,
                total: pending + processing + sent + failed,
            },
            rate_limit_tokens_remaining: self.inner.bucket.lock().tokens(),
        })
    }

    /// Run one guarded cycle outside the loop (used by callers that drive
    /// processing manually, and by tests)
    pub async fn run_cycle(&self) {
        self.inner.run_once().await;
    }
}

impl Drop for AutomationScheduler {
    fn drop(&mut self) {
        self.inner.enabled.store(false, Ordering::SeqCst);
        self.inner.wake.notify_waiters();
    }
}
