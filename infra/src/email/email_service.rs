//! Email Service Interface
//!
//! Defines the trait for email service implementations that deliver
//! verification codes and other transactional mail.

use async_trait::async_trait;

use crate::InfrastructureError;

/// Subject line of the signup verification email
pub const VERIFICATION_SUBJECT: &str = "Your OTP for Marketplace Signup";

/// Plain-text body of the signup verification email
pub fn verification_body(code: &str, expires_in_minutes: i64) -> String {
    format!(
        "Your OTP for signup is: {}\nThis OTP will expire in {} minutes.",
        code, expires_in_minutes
    )
}

/// Email service trait for sending transactional mail
///
/// Implementations include:
/// - SMTP relay through lettre
/// - Mock implementation for development
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Send a plain-text email
    ///
    /// # Returns
    ///
    /// * `Ok(message_id)` - Identifier of the accepted message
    /// * `Err(InfrastructureError)` - If the relay refused or could not be reached
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<String, InfrastructureError>;

    /// Send a signup verification code
    async fn send_verification_code(
        &self,
        to: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> Result<String, InfrastructureError> {
        let body = verification_body(code, expires_in_minutes);
        self.send_email(to, VERIFICATION_SUBJECT, &body).await
    }

    /// Get the service provider name
    fn provider_name(&self) -> &str;
}
