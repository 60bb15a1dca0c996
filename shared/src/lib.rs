//! Shared utilities and common types for the Campus Market server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Response envelopes
//! - Utility functions (email validation and masking)

pub mod config;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, DatabaseConfig, EmailProvider, Environment, LogFormat, LoggingConfig,
    OtpConfig, OtpStoreBackend, ServerConfig, SmtpConfig,
};
pub use types::{ApiResponse, ErrorResponse, HealthResponse, HealthStatus};
pub use utils::{email, is_valid_email, mask_email, normalize_email};
