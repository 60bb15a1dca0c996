//! SMTP Email Service Implementation
//!
//! Sends mail through an authenticated STARTTLS relay using lettre's async
//! transport on the tokio runtime.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use cm_shared::{mask_email, SmtpConfig};

use super::email_service::EmailService;
use crate::InfrastructureError;

/// SMTP relay email service
pub struct SmtpEmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpEmailService {
    /// Build the transport from configuration
    ///
    /// No connection is opened here; the first send connects.
    pub fn new(config: &SmtpConfig) -> Result<Self, InfrastructureError> {
        config.validate().map_err(InfrastructureError::Config)?;

        let address: Address = config
            .sender_address()
            .parse()
            .map_err(|e| InfrastructureError::Config(format!("Invalid sender address: {}", e)))?;
        let sender = Mailbox::new(Some(config.from_name.clone()), address);

        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| InfrastructureError::Config(format!("Invalid SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)))
            .build();

        info!(host = %config.host, port = config.port, "SMTP email service configured");

        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<String, InfrastructureError> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| InfrastructureError::Email(format!("Invalid recipient address: {}", e)))?;

        let message_id = Uuid::new_v4().to_string();
        let email = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(subject)
            .message_id(Some(format!("<{}@campus-market>", message_id)))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| InfrastructureError::Email(format!("Failed to build email: {}", e)))?;

        match self.transport.send(email).await {
            Ok(response) => {
                info!(
                    target: "email_service",
                    provider = "smtp",
                    to = %mask_email(to),
                    message_id = %message_id,
                    code = %response.code(),
                    "Email accepted by relay"
                );
                Ok(message_id)
            }
            Err(e) => {
                error!(
                    target: "email_service",
                    provider = "smtp",
                    to = %mask_email(to),
                    error = %e,
                    "Failed to send email"
                );
                Err(InfrastructureError::Email(e.to_string()))
            }
        }
    }

    fn provider_name(&self) -> &str {
        "SMTP"
    }
}
