//! Customer and session lookups consumed by the processor
//!
//! The customer/session CRUD stores live outside this engine; the processor
//! only needs the narrow read side defined here to resolve a destination
//! address and a share link for a job.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::DeliveryError;

/// Contact fields for one customer, as resolved at send time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Read-side lookups against the external customer and session stores.
#[async_trait]
pub trait ContactDirectory: Send + Sync + std::fmt::Debug {
    /// Resolve a customer's contact record; `None` if the customer does
    /// not exist.
    async fn customer(&self, customer_id: &str) -> Result<Option<CustomerContact>, DeliveryError>;

    /// Resolve the shareable photo URL for a session, if one has been
    /// published.
    async fn session_share_url(&self, session_id: &str) -> Result<Option<String>, DeliveryError>;
}

/// Fixed in-memory directory for tests and the demo binary.
#[derive(Debug, Clone, Default)]
pub struct StaticContactDirectory {
    customers: HashMap<String, CustomerContact>,
    share_urls: HashMap<String, String>,
}

impl StaticContactDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a customer record
    pub fn insert_customer(&mut self, customer_id: impl Into<String>, contact: CustomerContact) {
        self.customers.insert(customer_id.into(), contact);
    }

    /// Publish a share URL for a session
    pub fn insert_share_url(&mut self, session_id: impl Into<String>, url: impl Into<String>) {
        self.share_urls.insert(session_id.into(), url.into());
    }
}

#[async_trait]
impl ContactDirectory for StaticContactDirectory {
    async fn customer(&self, customer_id: &str) -> Result<Option<CustomerContact>, DeliveryError> {
        Ok(self.customers.get(customer_id).cloned())
    }

    async fn session_share_url(&self, session_id: &str) -> Result<Option<String>, DeliveryError> {
        Ok(self.share_urls.get(session_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory_lookups() {
        let mut directory = StaticContactDirectory::new();
        directory.insert_customer(
            "customer-1",
            CustomerContact {
                name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                phone: None,
            },
        );
        directory.insert_share_url("session-1", "https://photos.example.com/s/session-1");

        let contact = directory.customer("customer-1").await.unwrap().unwrap();
        assert_eq!(contact.email.as_deref(), Some("ada@example.com"));
        assert!(contact.phone.is_none());

        assert!(directory.customer("missing").await.unwrap().is_none());

        let url = directory.session_share_url("session-1").await.unwrap();
        assert_eq!(url.as_deref(), Some("https://photos.example.com/s/session-1"));
        assert!(directory.session_share_url("other").await.unwrap().is_none());
    }
}
