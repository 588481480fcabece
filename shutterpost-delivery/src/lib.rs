//! Delivery automation engine: queue processing, rate limiting, retries and
//! log retention for customer photo notifications.
//!
//! The engine drains a persistent queue of delivery jobs one at a time,
//! dispatching each through a channel provider (email, SMS, MMS) with
//! progressive retry backoff, a per-instance token bucket on outbound
//! sends, and an append-only audit log swept daily for retention.

pub mod config;
pub mod contact;
pub mod error;
pub mod processor;
pub mod provider;
pub mod rate_limiter;
pub mod retry;
pub mod scheduler;
pub mod service;
pub mod sweeper;

pub use config::{AutomationConfig, EngineConfig, MaintenanceConfig};
pub use contact::{ContactDirectory, CustomerContact, StaticContactDirectory};
pub use error::{DeliveryError, PreconditionError, ProviderError};
pub use processor::{CycleOutcome, DeliveryProcessor};
pub use provider::{NotificationProvider, OutboundMessage, ProviderRegistry, SendResult};
pub use rate_limiter::TokenBucket;
pub use retry::RetryPolicy;
pub use scheduler::{AutomationScheduler, QueueCounts, QueueStatus};
pub use service::AutomationService;
pub use sweeper::LogSweeper;
