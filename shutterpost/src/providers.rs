//! Dry-run providers that log notifications instead of sending them.

use std::sync::Arc;

use async_trait::async_trait;
use shutterpost_delivery::{
    DeliveryError, NotificationProvider, OutboundMessage, ProviderRegistry, SendResult,
};
use shutterpost_store::DeliveryMethod;
use tracing::info;

/// Provider that prints the notification to the log and reports success.
#[derive(Debug)]
pub struct ConsoleProvider {
    method: DeliveryMethod,
}

impl ConsoleProvider {
    #[must_use]
    pub const fn new(method: DeliveryMethod) -> Self {
        Self { method }
    }
}

#[async_trait]
impl NotificationProvider for ConsoleProvider {
    fn name(&self) -> &str {
        "console"
    }

    fn method(&self) -> DeliveryMethod {
        self.method
    }

    async fn send(&self, message: &OutboundMessage) -> Result<SendResult, DeliveryError> {
        info!(
            method = %self.method,
            recipient = %message.recipient,
            body = %message.body,
            "Dry-run delivery"
        );

        Ok(SendResult::success("console", Some(200), None, 0))
    }
}

/// Registry with a console provider on every outbound channel.
#[must_use]
pub fn console_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for method in [
        DeliveryMethod::Email,
        DeliveryMethod::Sms,
        DeliveryMethod::Mms,
    ] {
        registry.register(Arc::new(ConsoleProvider::new(method)));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_all_outbound_channels() {
        let registry = console_registry();
        assert_eq!(registry.len(), 3);
        assert!(registry.get(DeliveryMethod::Email).is_some());
        assert!(registry.get(DeliveryMethod::Sms).is_some());
        assert!(registry.get(DeliveryMethod::Mms).is_some());
        assert!(registry.get(DeliveryMethod::Manual).is_none());
    }

    #[tokio::test]
    async fn console_send_succeeds() {
        let provider = ConsoleProvider::new(DeliveryMethod::Sms);
        let result = provider
            .send(&OutboundMessage {
                recipient: "+15551234567".to_string(),
                body: "Your photos are ready!".to_string(),
                media_url: None,
            })
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.provider, "console");
    }
}
