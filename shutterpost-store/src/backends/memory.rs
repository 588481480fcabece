use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use tracing::trace;

use crate::{
    DeliveryJob, DeliveryJobId, DeliveryLogEntry, DeliveryMethod, DeliveryStatus, JobPatch,
    RecordStore, StoreError,
};

/// In-memory record store implementation
///
/// Jobs, log entries, and settings live in `RwLock`-protected maps. This
/// implementation is primarily intended for testing and the demo binary;
/// production deployments back the [`RecordStore`] trait with a real
/// transactional document store.
///
/// # Concurrency
/// The claim operation takes the jobs write lock for the whole
/// read-check-write sequence, so it behaves as the atomic
/// `Pending -> Processing` compare-and-swap the contract requires: of any
/// number of concurrent `claim` calls for one job, exactly one returns
/// `true`.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    jobs: Arc<RwLock<HashMap<DeliveryJobId, DeliveryJob>>>,
    logs: Arc<RwLock<Vec<DeliveryLogEntry>>>,
    settings: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryRecordStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current number of jobs in the store
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the
    /// underlying data.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Get the current number of log entries
    #[must_use]
    pub fn log_count(&self) -> usize {
        self.logs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Snapshot of all log entries, in append order (test helper)
    #[must_use]
    pub fn logs(&self) -> Vec<DeliveryLogEntry> {
        self.logs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Log entries for one delivery, in append order (test helper)
    #[must_use]
    pub fn logs_for(&self, id: &DeliveryJobId) -> Vec<DeliveryLogEntry> {
        self.logs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|entry| &entry.delivery_id == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_job(&self, job: DeliveryJob) -> crate::Result<()> {
        let mut jobs = self.jobs.write()?;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists(job.id));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get_job(&self, id: &DeliveryJobId) -> crate::Result<Option<DeliveryJob>> {
        Ok(self.jobs.read()?.get(id).cloned())
    }

    async fn find_next_eligible(&self, now_ms: u64) -> crate::Result<Option<DeliveryJob>> {
        let jobs = self.jobs.read()?;

        // Oldest first; the id breaks created_at ties deterministically
        // since ULIDs sort by creation time.
        Ok(jobs
            .values()
            .filter(|job| job.is_eligible(now_ms))
            .min_by_key(|job| (job.created_at, job.id.clone()))
            .cloned())
    }

    async fn claim(&self, id: &DeliveryJobId) -> crate::Result<bool> {
        let mut jobs = self.jobs.write()?;

        match jobs.get_mut(id) {
            Some(job) if job.status == DeliveryStatus::Pending => {
                job.status = DeliveryStatus::Processing;
                trace!(job_id = %id, "Claimed job");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_job(&self, id: &DeliveryJobId, patch: JobPatch) -> crate::Result<()> {
        let mut jobs = self.jobs.write()?;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        patch.apply(job);
        Ok(())
    }

    async fn count_by_status(&self, status: DeliveryStatus) -> crate::Result<usize> {
        Ok(self
            .jobs
            .read()?
            .values()
            .filter(|job| job.status == status)
            .count())
    }

    async fn count_by_method(&self, method: DeliveryMethod) -> crate::Result<usize> {
        Ok(self
            .jobs
            .read()?
            .values()
            .filter(|job| job.method == method)
            .count())
    }

    async fn append_log(&self, entry: DeliveryLogEntry) -> crate::Result<()> {
        self.logs.write()?.push(entry);
        Ok(())
    }

    async fn delete_logs_older_than(&self, cutoff_ms: u64) -> crate::Result<usize> {
        let mut logs = self.logs.write()?;
        let before = logs.len();
        logs.retain(|entry| entry.created_at >= cutoff_ms);
        let removed = before - logs.len();
        trace!(removed, cutoff_ms, "Swept log entries");
        Ok(removed)
    }

    async fn get_setting(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.settings.read()?.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &str) -> crate::Result<()> {
        self.settings
            .write()?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
