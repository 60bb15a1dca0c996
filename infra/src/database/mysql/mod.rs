//! MySQL implementations of core repository traits

pub mod otp_store;

pub use otp_store::MySqlOtpStore;
