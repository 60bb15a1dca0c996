pub mod otp;

pub use otp::{GuardedUpdate, InMemoryOtpStore, OtpStore};
