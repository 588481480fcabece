//! One-stop facade over the scheduler, processor and sweeper
//!
//! Embedders construct a single [`AutomationService`] from a record store,
//! a provider registry and a contact directory; everything else (processor,
//! scheduler, sweeper, token bucket) is wired internally from the engine
//! configuration.

use std::sync::Arc;

use shutterpost_store::RecordStore;
use tracing::info;

use crate::{
    config::EngineConfig,
    contact::ContactDirectory,
    error::DeliveryError,
    processor::DeliveryProcessor,
    provider::ProviderRegistry,
    scheduler::{AutomationScheduler, QueueStatus},
    sweeper::LogSweeper,
};

/// The assembled delivery automation engine
#[derive(Debug)]
pub struct AutomationService {
    scheduler: AutomationScheduler,
    sweeper: LogSweeper,
    config: EngineConfig,
}

impl AutomationService {
    /// Wire up the engine from its collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        providers: Arc<ProviderRegistry>,
        directory: Arc<dyn ContactDirectory>,
        config: EngineConfig,
    ) -> Self {
        let processor = DeliveryProcessor::new(
            Arc::clone(&store),
            providers,
            directory,
            config.automation.retry_policy(),
        );

        Self {
            scheduler: AutomationScheduler::new(processor, Arc::clone(&store), &config.automation),
            sweeper: LogSweeper::new(store, &config.maintenance),
            config,
        }
    }

    /// Begin automated queue processing. Idempotent.
    pub fn start_automation(&self) {
        self.scheduler.start();
    }

    /// Halt automated queue processing. Idempotent and cooperative.
    pub fn stop_automation(&self) {
        self.scheduler.stop();
    }

    /// Whether the automation loop is running
    #[must_use]
    pub fn is_automation_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Current queue totals and scheduler state
    ///
    /// # Errors
    /// Fails if the record store cannot be read.
    pub async fn get_queue_status(&self) -> Result<QueueStatus, DeliveryError> {
        self.scheduler.status().await
    }

    /// Run one guarded processing cycle outside the loop
    pub async fn run_cycle(&self) {
        self.scheduler.run_cycle().await;
    }

    /// Arm the daily log retention sweep. Idempotent.
    pub fn schedule_log_cleanup(&self) {
        self.sweeper.schedule();
    }

    /// Cancel the daily sweep. Safe to call when never scheduled.
    pub fn stop_log_cleanup(&self) {
        self.sweeper.stop();
    }

    /// Delete audit log entries older than `days`, immediately.
    ///
    /// # Errors
    /// Fails if the record store cannot be read or written.
    pub async fn cleanup_old_logs(&self, days: u32) -> Result<usize, DeliveryError> {
        self.sweeper.cleanup_old_logs(days).await
    }

    /// The engine configuration this service was built with
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stop everything: the automation loop and the sweep schedule.
    pub fn shutdown(&self) {
        info!("Shutting down delivery automation service");
        self.scheduler.stop();
        self.sweeper.stop();
    }
}
