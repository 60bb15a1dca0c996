//! Business services containing domain logic and use cases.

pub mod otp;

// Re-export commonly used types
pub use otp::{
    Clock, IssuedCode, ManualClock, Notifier, OtpManager, OtpManagerConfig, OtpSweeper,
    SweepConfig, SweepResult, SweeperHandle, SystemClock, VerifiedIdentity,
};
