//! The record store contract consumed by the delivery engine.

use async_trait::async_trait;

use crate::{
    DeliveryJob, DeliveryJobId, DeliveryLogEntry, DeliveryMethod, DeliveryStatus, JobPatch, Result,
};

/// Persistence capability set required by the delivery engine.
///
/// Implementations are assumed transactional: multi-step operations commit
/// or roll back as a unit, and readers never observe a partial write. The
/// engine relies on exactly one concurrency guarantee from the store:
/// [`claim`](Self::claim) is an atomic compare-and-swap on job status, so
/// two scheduler instances racing on the same queue can never both hold a
/// job in `Processing`.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Insert a new delivery job
    ///
    /// # Errors
    /// Returns [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists)
    /// if a job with the same id is present.
    async fn insert_job(&self, job: DeliveryJob) -> Result<()>;

    /// Fetch a job by id
    async fn get_job(&self, id: &DeliveryJobId) -> Result<Option<DeliveryJob>>;

    /// Return one job with status `Pending` whose `next_retry_at` is absent
    /// or `<= now_ms`, oldest `created_at` first.
    ///
    /// Two concurrent callers may be handed the same job; only one of their
    /// subsequent [`claim`](Self::claim) calls will succeed.
    async fn find_next_eligible(&self, now_ms: u64) -> Result<Option<DeliveryJob>>;

    /// Atomically transition a job from `Pending` to `Processing`.
    ///
    /// Returns `false` if the job was not `Pending` (already claimed,
    /// terminal, or unknown).
    async fn claim(&self, id: &DeliveryJobId) -> Result<bool>;

    /// Merge `patch` into the job record
    async fn update_job(&self, id: &DeliveryJobId, patch: JobPatch) -> Result<()>;

    /// Count jobs currently in `status`
    async fn count_by_status(&self, status: DeliveryStatus) -> Result<usize>;

    /// Count jobs using `method`
    async fn count_by_method(&self, method: DeliveryMethod) -> Result<usize>;

    /// Insert an immutable audit log record
    async fn append_log(&self, entry: DeliveryLogEntry) -> Result<()>;

    /// Bulk-delete log entries created before `cutoff_ms`.
    ///
    /// Returns the number of entries removed.
    async fn delete_logs_older_than(&self, cutoff_ms: u64) -> Result<usize>;

    /// Read a raw settings value
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw settings value
    async fn put_setting(&self, key: &str, value: &str) -> Result<()>;
}
