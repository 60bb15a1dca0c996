//! # Infrastructure Layer
//!
//! Concrete implementations of the seams defined in `cm_core`:
//!
//! - **Database**: MySQL `OtpStore` using SQLx
//! - **Cache**: Redis client and a Redis-backed `OtpStore`
//! - **Email**: SMTP delivery through lettre, a mock service for development,
//!   and the adapter that turns either into a `Notifier`
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis caching support (default)

// Re-export core error types for convenience
pub use cm_core::errors::{DomainError, DomainResult, OtpError};

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis client and OTP store
pub mod cache;

/// Email module - SMTP and mock email delivery
pub mod email;

/// Configuration module for infrastructure services
pub mod config {
    //! Configuration loading for infrastructure services

    use serde::{Deserialize, Serialize};

    pub use cm_shared::config::{CacheConfig, DatabaseConfig, SmtpConfig};

    /// Infrastructure configuration settings
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct InfrastructureConfig {
        /// Database configuration
        pub database: DatabaseConfig,
        /// Redis cache configuration
        pub cache: CacheConfig,
        /// Outbound email configuration
        pub smtp: SmtpConfig,
    }

    impl InfrastructureConfig {
        /// Load from environment variables, reading `.env` first if present
        pub fn from_env() -> Self {
            dotenvy::dotenv().ok();

            Self {
                database: DatabaseConfig::from_env(),
                cache: CacheConfig::from_env(),
                smtp: SmtpConfig::from_env(),
            }
        }
    }
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Email delivery error
    #[error("Email error: {0}")]
    Email(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Email(message) => OtpError::Delivery { message }.into(),
            other => OtpError::storage(other).into(),
        }
    }
}
