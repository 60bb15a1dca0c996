//! Mock Email Service Implementation
//!
//! Stands in for the SMTP relay during development and tests. Messages are
//! kept in memory; only the masked recipient is logged.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use cm_shared::mask_email;

use super::email_service::EmailService;
use crate::InfrastructureError;

/// A message captured by the mock service
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub message_id: String,
}

/// Mock email service for development and testing
#[derive(Clone, Default)]
pub struct MockEmailService {
    /// Counter for tracking number of messages sent
    message_count: Arc<AtomicU64>,
    /// Whether to simulate failures
    simulate_failure: Arc<AtomicBool>,
    outbox: Arc<Mutex<Vec<SentEmail>>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock service that fails every send
    pub fn failing() -> Self {
        let service = Self::new();
        service.set_simulate_failure(true);
        service
    }

    /// Get the total number of messages sent
    pub fn get_message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }

    /// Most recent message sent to `to`
    pub fn last_message_to(&self, to: &str) -> Option<SentEmail> {
        let outbox = self.outbox.lock().unwrap_or_else(|e| e.into_inner());
        outbox.iter().rev().find(|m| m.to == to).cloned()
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<String, InfrastructureError> {
        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(to = %mask_email(to), "Mock email service simulating failure");
            return Err(InfrastructureError::Email("Simulated email sending failure".to_string()));
        }

        let message_id = format!("mock_{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;

        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
                message_id: message_id.clone(),
            });

        info!(
            target: "email_service",
            provider = "mock",
            to = %mask_email(to),
            message_id = %message_id,
            count,
            "Mock email recorded"
        );

        Ok(message_id)
    }

    fn provider_name(&self) -> &str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_messages() {
        let service = MockEmailService::new();

        let id = service
            .send_verification_code("a@campus.edu", "123456", 10)
            .await
            .unwrap();

        assert!(id.starts_with("mock_"));
        assert_eq!(service.get_message_count(), 1);

        let sent = service.last_message_to("a@campus.edu").unwrap();
        assert_eq!(sent.subject, "Your OTP for Marketplace Signup");
        assert!(sent.body.contains("123456"));
        assert!(sent.body.contains("10 minutes"));
    }

    #[tokio::test]
    async fn test_mock_failure_simulation() {
        let service = MockEmailService::failing();

        let result = service.send_email("a@campus.edu", "s", "b").await;
        assert!(matches!(result, Err(InfrastructureError::Email(_))));
        assert_eq!(service.get_message_count(), 0);

        service.set_simulate_failure(false);
        assert!(service.send_email("a@campus.edu", "s", "b").await.is_ok());
    }
}
