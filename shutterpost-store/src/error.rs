//! Error types for the shutterpost-store crate.

use thiserror::Error;

use crate::DeliveryJobId;

/// Top-level record store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Job not found in the store.
    #[error("Job not found: {0}")]
    NotFound(DeliveryJobId),

    /// Job already exists in the store.
    #[error("Job already exists: {0}")]
    AlreadyExists(DeliveryJobId),

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (lock poisoning, backend failures, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for record store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
