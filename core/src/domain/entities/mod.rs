//! Domain entities.

pub mod otp_record;

pub use otp_record::{OtpRecord, CODE_LENGTH, DEFAULT_MAX_ATTEMPTS, DEFAULT_TTL_MINUTES};
