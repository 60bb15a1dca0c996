//! Email one-time password workflow
//!
//! This module provides:
//! - Code generation from the OS CSPRNG
//! - Issuance with rollback when delivery fails
//! - Single-use verification with expiry and an attempt limit
//! - A background sweep of expired codes

mod clock;
mod code;
mod config;
mod service;
mod sweeper;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use code::{generate_code, is_well_formed};
pub use config::OtpManagerConfig;
pub use service::OtpManager;
pub use sweeper::{OtpSweeper, SweepConfig, SweepResult, SweeperHandle};
pub use traits::Notifier;
pub use types::{IssuedCode, VerifiedIdentity};
