//! Email Service Module
//!
//! Email delivery for verification codes:
//!
//! - **Email Service Trait**: Common interface for all providers
//! - **SMTP**: Authenticated STARTTLS relay through lettre
//! - **Mock Implementation**: In-memory outbox for development
//! - **Notifier Adapter**: Exposes any email service as a core `Notifier`

use std::sync::Arc;

use cm_shared::{EmailProvider, SmtpConfig};

use crate::InfrastructureError;

pub mod email_service;
pub mod mock_email;
pub mod notifier_adapter;
pub mod smtp;

pub use email_service::{verification_body, EmailService, VERIFICATION_SUBJECT};
pub use mock_email::{MockEmailService, SentEmail};
pub use notifier_adapter::EmailNotifier;
pub use smtp::SmtpEmailService;

/// Create an email service based on configuration
///
/// An SMTP provider that cannot be built is an error; the mock is only
/// returned when it was asked for.
pub fn create_email_service(config: &SmtpConfig) -> Result<Arc<dyn EmailService>, InfrastructureError> {
    match config.provider {
        EmailProvider::Mock => {
            tracing::warn!(provider = "mock", "Verification emails will not leave this process");
            Ok(Arc::new(MockEmailService::new()))
        }
        EmailProvider::Smtp => {
            let service = SmtpEmailService::new(config).map_err(|e| {
                tracing::error!(provider = "smtp", error = %e, "Failed to initialize SMTP email service");
                e
            })?;
            Ok(Arc::new(service))
        }
    }
}
