//! Domain-specific error types and error handling.

mod types;

pub use types::OtpError;

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Otp(#[from] OtpError),
}

impl DomainError {
    /// Borrow the OTP outcome, if this error carries one
    pub fn as_otp(&self) -> Option<&OtpError> {
        match self {
            DomainError::Otp(err) => Some(err),
            _ => None,
        }
    }

    /// Treat anything that is not already an OTP outcome as a storage failure
    pub fn into_storage(self) -> DomainError {
        match self {
            DomainError::Otp(_) => self,
            other => OtpError::Storage {
                message: other.to_string(),
            }
            .into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
