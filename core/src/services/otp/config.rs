//! Configuration for the OTP manager

use chrono::Duration;
use cm_shared::OtpConfig;

use crate::domain::entities::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TTL_MINUTES};

/// Configuration for the OTP manager
#[derive(Debug, Clone)]
pub struct OtpManagerConfig {
    /// Number of minutes before a code expires
    pub ttl_minutes: i64,
    /// Failed attempts tolerated per code
    pub max_attempts: u32,
    /// Minimum seconds between two codes for the same address (0 disables)
    pub resend_cooldown_seconds: i64,
}

impl OtpManagerConfig {
    pub fn ttl(&self) -> Duration {
        Duration::minutes(self.ttl_minutes)
    }
}

impl Default for OtpManagerConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: DEFAULT_TTL_MINUTES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            resend_cooldown_seconds: 0,
        }
    }
}

impl From<&OtpConfig> for OtpManagerConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            ttl_minutes: config.ttl_minutes,
            max_attempts: config.max_attempts,
            resend_cooldown_seconds: config.resend_cooldown_seconds,
        }
    }
}
