//! Error taxonomy for the one-time password workflow
//!
//! `NotFound`, `Expired`, `Mismatch` and `AttemptsExceeded` are expected
//! user-facing outcomes. `Storage` and `Delivery` are infrastructure failures
//! that the caller may retry.

use thiserror::Error;

/// Outcomes of issuing or verifying a one-time password
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("No outstanding verification code")]
    NotFound,

    #[error("Verification code expired")]
    Expired,

    #[error("Verification code does not match ({remaining_attempts} attempts remaining)")]
    Mismatch { remaining_attempts: u32 },

    #[error("Maximum verification attempts exceeded")]
    AttemptsExceeded,

    #[error("A code was sent recently; retry in {retry_after_seconds} seconds")]
    ResendCooldown { retry_after_seconds: i64 },

    #[error("Storage failure: {message}")]
    Storage { message: String },

    #[error("Delivery failure: {message}")]
    Delivery { message: String },
}

impl OtpError {
    /// Stable machine-readable code for this outcome
    pub fn code(&self) -> &'static str {
        match self {
            OtpError::InvalidInput { .. } => "INVALID_INPUT",
            OtpError::NotFound => "CODE_NOT_FOUND",
            OtpError::Expired => "CODE_EXPIRED",
            OtpError::Mismatch { .. } => "CODE_MISMATCH",
            OtpError::AttemptsExceeded => "MAX_ATTEMPTS_EXCEEDED",
            OtpError::ResendCooldown { .. } => "RESEND_COOLDOWN",
            OtpError::Storage { .. } => "STORAGE_FAILURE",
            OtpError::Delivery { .. } => "DELIVERY_FAILURE",
        }
    }

    /// Infrastructure failures are worth retrying; user outcomes are not
    pub fn is_retryable(&self) -> bool {
        matches!(self, OtpError::Storage { .. } | OtpError::Delivery { .. })
    }

    /// Shorthand used by store implementations
    pub fn storage(err: impl std::fmt::Display) -> Self {
        OtpError::Storage {
            message: err.to_string(),
        }
    }
}
