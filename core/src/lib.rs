//! # Campus Market Core
//!
//! Core business logic and domain layer for the Campus Market backend.
//! This crate contains the one-time password workflow used for email
//! verification: the domain entity, the storage and delivery seams, the
//! manager that issues and verifies codes, and the background expiry sweep.
//! It has no dependency on any web framework.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{OtpRecord, CODE_LENGTH, DEFAULT_MAX_ATTEMPTS, DEFAULT_TTL_MINUTES};
pub use errors::{DomainError, DomainResult, OtpError};
pub use repositories::{GuardedUpdate, InMemoryOtpStore, OtpStore};
pub use services::{
    Clock, IssuedCode, ManualClock, Notifier, OtpManager, OtpManagerConfig, OtpSweeper,
    SweepConfig, SweepResult, SweeperHandle, SystemClock, VerifiedIdentity,
};
