//! Email Notifier Adapter
//!
//! Implements the core `Notifier` trait on top of any `EmailService`,
//! bridging the infrastructure implementation with the core domain trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use cm_core::services::Notifier;

use super::email_service::EmailService;

/// Adapter that delivers codes by email
pub struct EmailNotifier<E: EmailService + ?Sized> {
    inner: Arc<E>,
}

impl<E: EmailService + ?Sized> EmailNotifier<E> {
    pub fn new(inner: Arc<E>) -> Self {
        Self { inner }
    }
}

/// Whole minutes left until `expires_at`, rounded up and never below one
pub fn minutes_until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (expires_at - now).num_seconds();
    ((seconds + 59) / 60).max(1)
}

#[async_trait]
impl<E: EmailService + ?Sized> Notifier for EmailNotifier<E> {
    async fn send(
        &self,
        identifier: &str,
        code: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, String> {
        let minutes = minutes_until(expires_at, issued_at);

        self.inner
            .send_verification_code(identifier, code, minutes)
            .await
            .map_err(|e| e.to_string())
    }
}
