//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `cache` - Redis configuration
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `otp` - One-time password lifetime, attempt limits and storage backend
//! - `server` - HTTP server and CORS configuration
//! - `smtp` - Outbound email delivery

pub mod cache;
pub mod database;
pub mod environment;
pub mod otp;
pub mod server;
pub mod smtp;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::{OtpConfig, OtpStoreBackend};
pub use server::{CorsConfig, ServerConfig};
pub use smtp::{EmailProvider, SmtpConfig};

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Cache configuration
    pub cache: CacheConfig,

    /// Email delivery configuration
    pub smtp: SmtpConfig,

    /// One-time password configuration
    pub otp: OtpConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            smtp: SmtpConfig::default(),
            otp: OtpConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load the full configuration from environment variables
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        Self {
            environment,
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            smtp: SmtpConfig::from_env(),
            otp: OtpConfig::from_env(),
            cors: CorsConfig::from_env(),
            logging: LoggingConfig::from_env(environment),
        }
    }

    /// Validate configuration values that cannot be defaulted safely
    pub fn validate(&self) -> Result<(), String> {
        self.otp.validate()?;

        if self.environment.is_production() {
            if self.smtp.provider == EmailProvider::Mock {
                return Err("Mock email provider is not allowed in production".to_string());
            }
            if self.otp.store == OtpStoreBackend::Memory {
                return Err("In-memory OTP store is not allowed in production".to_string());
            }
        }

        if self.smtp.provider == EmailProvider::Smtp {
            self.smtp.validate()?;
        }

        Ok(())
    }
}

/// Read an environment variable and parse it, falling back to a default
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.otp.ttl_minutes, 10);
    }

    #[test]
    fn test_production_rejects_mock_email() {
        let mut config = AppConfig::default();
        config.environment = Environment::Production;
        config.otp.store = OtpStoreBackend::MySql;

        let err = config.validate().unwrap_err();
        assert!(err.contains("Mock email provider"));
    }

    #[test]
    fn test_production_rejects_memory_store() {
        let mut config = AppConfig::default();
        config.environment = Environment::Production;
        config.smtp.provider = EmailProvider::Smtp;
        config.smtp.username = "mailer@example.com".to_string();
        config.smtp.password = "secret".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.contains("In-memory OTP store"));
    }

    #[test]
    fn test_production_rejects_sender_that_is_not_an_address() {
        let mut config = AppConfig::default();
        config.environment = Environment::Production;
        config.otp.store = OtpStoreBackend::MySql;
        config.smtp.provider = EmailProvider::Smtp;
        config.smtp.username = "marketmailer".to_string();
        config.smtp.password = "secret".to_string();

        assert!(config.validate().is_err());
    }
}
