//! Outbound email configuration

use serde::{Deserialize, Serialize};

use super::env_or;
use crate::utils::is_valid_email;

/// Email delivery provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Real SMTP relay
    Smtp,
    /// Log-only provider for development and tests
    Mock,
}

impl std::str::FromStr for EmailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smtp" => Ok(EmailProvider::Smtp),
            "mock" => Ok(EmailProvider::Mock),
            _ => Err(format!("Invalid email provider: {}", s)),
        }
    }
}

/// SMTP relay configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    /// Which provider to use
    pub provider: EmailProvider,

    /// SMTP relay host
    pub host: String,

    /// SMTP relay port (STARTTLS)
    pub port: u16,

    /// SMTP account user name
    pub username: String,

    /// SMTP account password
    pub password: String,

    /// Sender address; defaults to the user name when empty
    #[serde(default)]
    pub from_address: String,

    /// Display name used in the From header
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Seconds before an SMTP exchange is abandoned
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("provider", &self.provider)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            provider: EmailProvider::Mock,
            host: String::from("smtp.gmail.com"),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_address: String::new(),
            from_name: default_from_name(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl SmtpConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: env_or("EMAIL_PROVIDER", defaults.provider),
            host: std::env::var("SMTP_HOST").unwrap_or(defaults.host),
            port: env_or("SMTP_PORT", defaults.port),
            username: std::env::var("EMAIL_USER").unwrap_or_default(),
            password: std::env::var("EMAIL_PASSWORD").unwrap_or_default(),
            from_address: std::env::var("EMAIL_FROM").unwrap_or_default(),
            from_name: std::env::var("EMAIL_FROM_NAME").unwrap_or(defaults.from_name),
            timeout_seconds: env_or("SMTP_TIMEOUT_SECONDS", defaults.timeout_seconds),
        }
    }

    /// The address placed in the From header
    pub fn sender_address(&self) -> &str {
        if self.from_address.is_empty() {
            &self.username
        } else {
            &self.from_address
        }
    }

    /// Check that a real relay has credentials, a host and a usable sender
    pub fn validate(&self) -> Result<(), String> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err("Email configuration missing: EMAIL_USER and EMAIL_PASSWORD are required".to_string());
        }
        if self.host.is_empty() {
            return Err("Email configuration missing: SMTP_HOST is required".to_string());
        }
        if !is_valid_email(self.sender_address()) {
            return Err(
                "Email configuration invalid: EMAIL_FROM (or EMAIL_USER when unset) must be an email address"
                    .to_string(),
            );
        }
        Ok(())
    }
}

fn default_from_name() -> String {
    String::from("Campus Market")
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_address_falls_back_to_username() {
        let mut config = SmtpConfig::default();
        config.username = "mailer@example.com".to_string();
        assert_eq!(config.sender_address(), "mailer@example.com");

        config.from_address = "no-reply@example.com".to_string();
        assert_eq!(config.sender_address(), "no-reply@example.com");
    }

    #[test]
    fn test_validate_requires_credentials() {
        let config = SmtpConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_sender_address() {
        let mut config = SmtpConfig {
            provider: EmailProvider::Smtp,
            username: "marketmailer".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("EMAIL_FROM"));

        config.from_address = "no-reply@campus.edu".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = SmtpConfig::default();
        config.password = "hunter2".to_string();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
