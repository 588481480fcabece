//! Typed error handling for delivery operations.
//!
//! The taxonomy mirrors how failures are treated by the processor:
//! - Precondition failures are short-circuited before any network call
//! - Provider failures come back from (or instead of) the channel provider
//! - Store errors surface persistence problems
//! - A missing provider is a configuration problem
//!
//! All of these are folded into a failed send outcome by the processor, so
//! the scheduler loop never sees an exception from a processing cycle.

use shutterpost_store::DeliveryMethod;
use thiserror::Error;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// A required input was missing or invalid; no network call was made.
    #[error("Precondition failure: {0}")]
    Precondition(#[from] PreconditionError),

    /// The notification provider failed or rejected the send.
    #[error("Provider failure: {0}")]
    Provider(#[from] ProviderError),

    /// The record store failed.
    #[error("Record store error: {0}")]
    Store(#[from] shutterpost_store::StoreError),

    /// No provider is configured for the job's delivery method.
    #[error("No provider configured for method: {0}")]
    MissingProvider(DeliveryMethod),
}

/// Failures detected before any provider is invoked.
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// The referenced customer record does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// The customer exists but lacks the contact field the method needs.
    #[error("Customer {customer_id} has no contact info for {method}")]
    NoContact {
        customer_id: String,
        method: DeliveryMethod,
    },

    /// The payload URL is not a safe, secure-transport URL.
    #[error("Invalid payload URL: {0}")]
    InvalidUrl(String),
}

/// Failures reported by (or on behalf of) a notification provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request could not be completed (network, I/O, serialization).
    #[error("Request failed: {0}")]
    Request(String),

    /// The provider rejected the send with a status code.
    #[error("Rejected ({code}): {message}")]
    Rejected { code: u16, message: String },

    /// The provider call timed out.
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl DeliveryError {
    /// Normalized error code recorded in the send result and audit log.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Precondition(precondition) => match precondition {
                PreconditionError::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
                PreconditionError::NoContact { .. } => "NO_CONTACT",
                PreconditionError::InvalidUrl(_) => "INVALID_URL",
            },
            Self::Provider(provider) => match provider {
                ProviderError::Request(_) => "PROVIDER_ERROR",
                ProviderError::Rejected { .. } => "PROVIDER_REJECTED",
                ProviderError::Timeout(_) => "PROVIDER_TIMEOUT",
            },
            Self::Store(_) => "STORE_ERROR",
            Self::MissingProvider(_) => "NO_PROVIDER",
        }
    }

    /// Returns `true` if this failure was detected without a network call.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}
