//! HTTP route handlers
//!
//! - `health` - liveness endpoint
//! - `otp` - email verification code issue and verify

pub mod health;
pub mod otp;
