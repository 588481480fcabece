//! Record store contracts and types for the shutterpost delivery engine
//!
//! This crate owns:
//! - The queue and audit-log record types (`DeliveryJob`, `DeliveryLogEntry`)
//! - The `RecordStore` trait the delivery engine consumes
//! - An in-memory backend for tests and the demo binary
//! - The typed view over persisted automation settings

pub mod backends;
pub mod error;
pub mod settings;
pub mod store;
pub mod types;

pub use backends::MemoryRecordStore;
pub use error::{Result, StoreError};
pub use settings::AutomationSettings;
pub use store::RecordStore;
pub use types::{
    DeliveryJob, DeliveryJobId, DeliveryLogEntry, DeliveryLogId, DeliveryMethod, DeliveryStatus,
    JobPatch, LogOutcome, now_millis,
};
