//! Record types for the delivery queue and its audit log.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Current wall-clock time as unix-epoch milliseconds.
///
/// All persisted timestamps use this representation so that records can be
/// compared and serialized without timezone concerns.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Identifier for a delivery job.
///
/// A ULID, lexicographically sortable by creation time and
/// collision-resistant, so the eligibility tie-break on `(created_at, id)`
/// is stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryJobId {
    id: ulid::Ulid,
}

impl DeliveryJobId {
    /// Create a job ID from an existing ULID
    #[must_use]
    pub const fn new(id: ulid::Ulid) -> Self {
        Self { id }
    }

    /// Generate a new unique job ID
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }

    /// Get the underlying ULID
    #[must_use]
    pub const fn ulid(&self) -> ulid::Ulid {
        self.id
    }
}

impl std::fmt::Display for DeliveryJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl serde::Serialize for DeliveryJobId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for DeliveryJobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&s).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

/// Identifier for an audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryLogId {
    id: ulid::Ulid,
}

impl DeliveryLogId {
    /// Generate a new unique log entry ID
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }

    /// Get the underlying ULID
    #[must_use]
    pub const fn ulid(&self) -> ulid::Ulid {
        self.id
    }
}

impl std::fmt::Display for DeliveryLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl serde::Serialize for DeliveryLogId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for DeliveryLogId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&s).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

/// How a delivery is sent to the customer.
///
/// `Maintenance` never appears on a job; it tags the synthetic log entries
/// written by the retention sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Email,
    Sms,
    Mms,
    /// Hand-delivered by the photographer; no provider involved.
    Manual,
    Maintenance,
}

impl DeliveryMethod {
    /// Stable lowercase name, matching the serialized form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Mms => "mms",
            Self::Manual => "manual",
            Self::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a delivery job.
///
/// Transitions: `Pending -> Processing -> {Sent | Pending | Failed}`.
/// `Sent` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl DeliveryStatus {
    /// Whether no further transition can occur from this status
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Sent => "sent",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome recorded in a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutcome {
    Sent,
    Failed,
    /// Retention sweep ran; `response_data` carries the deleted count.
    Cleanup,
}

/// One queued unit of outbound customer notification work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryJob {
    /// Unique identifier, assigned at creation, immutable
    pub id: DeliveryJobId,
    /// Reference to the photo session this delivery belongs to (opaque)
    pub session_id: String,
    /// Reference to the customer being notified (opaque)
    pub customer_id: String,
    /// Channel used to reach the customer
    pub method: DeliveryMethod,
    /// Current lifecycle state
    pub status: DeliveryStatus,
    /// Delivery attempts made so far
    pub attempt: u32,
    /// Earliest time (unix millis) the job becomes eligible again;
    /// `None` means eligible immediately
    pub next_retry_at: Option<u64>,
    /// Unix millis when the job was queued
    pub created_at: u64,
    /// Unix millis of terminal success, set only on `Sent`
    pub sent_at: Option<u64>,
    /// Terminal failure detail, set when the job reaches `Failed`
    pub last_error: Option<String>,
}

impl DeliveryJob {
    /// Create a new pending job for the given session/customer pair
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        customer_id: impl Into<String>,
        method: DeliveryMethod,
    ) -> Self {
        Self {
            id: DeliveryJobId::generate(),
            session_id: session_id.into(),
            customer_id: customer_id.into(),
            method,
            status: DeliveryStatus::Pending,
            attempt: 0,
            next_retry_at: None,
            created_at: now_millis(),
            sent_at: None,
            last_error: None,
        }
    }

    /// Whether this job may be handed to the processor at `now_ms`
    #[must_use]
    pub fn is_eligible(&self, now_ms: u64) -> bool {
        self.status == DeliveryStatus::Pending
            && self.next_retry_at.is_none_or(|at| at <= now_ms)
    }
}

/// Field merge applied by [`update_job`](crate::RecordStore::update_job).
///
/// `next_retry_at` is doubly optional so a patch can distinguish "leave
/// untouched" (`None`) from "clear the retry time" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<DeliveryStatus>,
    pub attempt: Option<u32>,
    pub sent_at: Option<u64>,
    pub next_retry_at: Option<Option<u64>>,
    pub last_error: Option<String>,
}

impl JobPatch {
    /// Merge this patch into `job`
    pub fn apply(&self, job: &mut DeliveryJob) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(attempt) = self.attempt {
            job.attempt = attempt;
        }
        if let Some(sent_at) = self.sent_at {
            job.sent_at = Some(sent_at);
        }
        if let Some(next_retry_at) = self.next_retry_at {
            job.next_retry_at = next_retry_at;
        }
        if let Some(last_error) = &self.last_error {
            job.last_error = Some(last_error.clone());
        }
    }
}

/// Append-only audit record of one delivery attempt (or one sweep run).
///
/// Never mutated after creation; removed only by the retention sweeper once
/// older than the retention window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLogEntry {
    pub id: DeliveryLogId,
    pub delivery_id: DeliveryJobId,
    pub session_id: String,
    pub customer_id: String,
    pub method: DeliveryMethod,
    pub outcome: LogOutcome,
    pub attempt: u32,
    /// Unix millis when the entry was written
    pub created_at: u64,
    /// Provider that handled (or refused) the attempt
    pub provider: String,
    /// Provider-reported status code, when one exists
    pub response_code: Option<u16>,
    /// Wall-clock duration of the attempt in milliseconds
    pub processing_time_ms: u64,
    /// Opaque diagnostic payload from the provider
    pub response_data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_starts_pending_with_zero_attempts() {
        let job = DeliveryJob::new("session-1", "customer-1", DeliveryMethod::Email);
        assert_eq!(job.status, DeliveryStatus::Pending);
        assert_eq!(job.attempt, 0);
        assert!(job.next_retry_at.is_none());
        assert!(job.sent_at.is_none());
        assert!(job.last_error.is_none());
    }

    #[test]
    fn eligibility_respects_next_retry_at() {
        let mut job = DeliveryJob::new("session-1", "customer-1", DeliveryMethod::Sms);
        let now = now_millis();

        assert!(job.is_eligible(now));

        job.next_retry_at = Some(now + 5_000);
        assert!(!job.is_eligible(now));
        assert!(job.is_eligible(now + 5_000));

        job.next_retry_at = None;
        job.status = DeliveryStatus::Processing;
        assert!(!job.is_eligible(now));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!DeliveryStatus::Pending.is_terminal());
        assert!(!DeliveryStatus::Processing.is_terminal());
        assert!(DeliveryStatus::Sent.is_terminal());
        assert!(DeliveryStatus::Failed.is_terminal());
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut job = DeliveryJob::new("session-1", "customer-1", DeliveryMethod::Email);
        job.next_retry_at = Some(42);

        let patch = JobPatch {
            status: Some(DeliveryStatus::Sent),
            attempt: Some(2),
            sent_at: Some(1_000),
            next_retry_at: Some(None),
            last_error: None,
        };
        patch.apply(&mut job);

        assert_eq!(job.status, DeliveryStatus::Sent);
        assert_eq!(job.attempt, 2);
        assert_eq!(job.sent_at, Some(1_000));
        assert_eq!(job.next_retry_at, None);
        assert!(job.last_error.is_none());
    }

    #[test]
    fn job_ids_are_unique_and_sortable() {
        let a = DeliveryJobId::generate();
        let b = DeliveryJobId::generate();
        assert_ne!(a, b);

        // ULID string form round-trips through serde
        let json = serde_json::to_string(&a).unwrap();
        let back: DeliveryJobId = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }

    #[test]
    fn method_names_match_serialized_form() {
        for method in [
            DeliveryMethod::Email,
            DeliveryMethod::Sms,
            DeliveryMethod::Mms,
            DeliveryMethod::Manual,
            DeliveryMethod::Maintenance,
        ] {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }
}
