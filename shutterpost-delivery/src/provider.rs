//! Notification provider contract and the send-result shape
//!
//! Providers are external collaborators, one per channel. The engine only
//! depends on the normalized [`SendResult`] contract; retry policy never
//! leaks into a provider, and provider errors never escape a processing
//! cycle.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shutterpost_store::DeliveryMethod;
use url::Url;

use crate::error::{DeliveryError, PreconditionError};

/// Normalized outcome of one provider send (or one short-circuited
/// precondition failure that stood in for it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResult {
    /// Whether the notification was accepted by the channel
    pub success: bool,
    /// Provider that handled (or refused) the attempt
    pub provider: String,
    /// Provider-reported status code, when one exists
    pub status: Option<u16>,
    /// Provider-side message identifier, on success
    pub message_id: Option<String>,
    /// Normalized error code, on failure
    pub error_code: Option<String>,
    /// Human-readable error detail, on failure
    pub error_message: Option<String>,
    /// Wall-clock duration of the attempt in milliseconds
    pub processing_time_ms: u64,
    /// Opaque diagnostic payload
    pub raw_response: Option<serde_json::Value>,
}

impl SendResult {
    /// Successful send
    #[must_use]
    pub fn success(
        provider: impl Into<String>,
        status: Option<u16>,
        message_id: Option<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            success: true,
            provider: provider.into(),
            status,
            message_id,
            error_code: None,
            error_message: None,
            processing_time_ms,
            raw_response: None,
        }
    }

    /// Failed send with a normalized error code.
    ///
    /// The code and message are mirrored into `raw_response` so the audit
    /// log carries them without its own error columns.
    #[must_use]
    pub fn failure(
        provider: impl Into<String>,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
        processing_time_ms: u64,
    ) -> Self {
        let error_code = error_code.into();
        let error_message = error_message.into();

        Self {
            success: false,
            provider: provider.into(),
            status: None,
            message_id: None,
            raw_response: Some(json!({
                "errorCode": error_code,
                "errorMessage": error_message,
            })),
            error_code: Some(error_code),
            error_message: Some(error_message),
            processing_time_ms,
        }
    }

    /// Fold an engine error into the failed-result shape
    #[must_use]
    pub fn from_error(provider: impl Into<String>, error: &DeliveryError, elapsed_ms: u64) -> Self {
        Self::failure(provider, error.error_code(), error.to_string(), elapsed_ms)
    }
}

/// The resolved notification handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Email address or phone number, per the channel
    pub recipient: String,
    /// Message body text
    pub body: String,
    /// Link to the customer's photos, already validated
    pub media_url: Option<String>,
}

/// Abstract send capability, implemented externally per channel.
///
/// Implementations report transport failures through `Err`; the processor
/// folds those into a failed [`SendResult`] so its retry accounting stays
/// uniform.
#[async_trait]
pub trait NotificationProvider: Send + Sync + std::fmt::Debug {
    /// Provider name recorded in results and log entries
    fn name(&self) -> &str;

    /// The channel this provider serves
    fn method(&self) -> DeliveryMethod;

    /// Deliver one notification
    async fn send(&self, message: &OutboundMessage) -> Result<SendResult, DeliveryError>;
}

/// Per-channel provider registry.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<DeliveryMethod, Arc<dyn NotificationProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own method; replaces any previous
    /// provider for that channel.
    pub fn register(&mut self, provider: Arc<dyn NotificationProvider>) {
        self.providers.insert(provider.method(), provider);
    }

    /// Look up the provider for a method
    #[must_use]
    pub fn get(&self, method: DeliveryMethod) -> Option<Arc<dyn NotificationProvider>> {
        self.providers.get(&method).cloned()
    }

    /// Number of registered channels
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Validate a payload URL before it is handed to any provider.
///
/// The URL must parse, use secure transport, and carry no executable-script
/// markers. Violations short-circuit the attempt with `INVALID_URL` and no
/// network call.
pub fn validate_media_url(raw: &str) -> Result<(), PreconditionError> {
    let parsed =
        Url::parse(raw).map_err(|e| PreconditionError::InvalidUrl(format!("{raw}: {e}")))?;

    if parsed.scheme() != "https" {
        return Err(PreconditionError::InvalidUrl(format!(
            "{raw}: scheme must be https"
        )));
    }

    let lowered = raw.to_ascii_lowercase();
    if lowered.contains("javascript:") || lowered.contains("<script") {
        return Err(PreconditionError::InvalidUrl(format!(
            "{raw}: script markers are not allowed"
        )));
    }

    Ok(())
}
