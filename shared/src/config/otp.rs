//! One-time password configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// Where outstanding codes are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpStoreBackend {
    /// Process-local map; codes are lost on restart
    Memory,
    /// MySQL table `otp_codes`
    #[serde(rename = "mysql")]
    MySql,
    /// Redis keys with native expiry
    Redis,
}

impl std::str::FromStr for OtpStoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(OtpStoreBackend::Memory),
            "mysql" => Ok(OtpStoreBackend::MySql),
            "redis" => Ok(OtpStoreBackend::Redis),
            _ => Err(format!("Invalid OTP store backend: {}", s)),
        }
    }
}

/// OTP lifecycle settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Minutes a code stays valid after issuance
    pub ttl_minutes: i64,

    /// Failed attempts allowed against a single code
    pub max_attempts: u32,

    /// Minimum seconds between two codes for the same address (0 disables)
    #[serde(default)]
    pub resend_cooldown_seconds: i64,

    /// Seconds between expiry sweeps
    pub sweep_interval_seconds: u64,

    /// Whether the expiry sweep runs at all
    #[serde(default = "default_sweep_enabled")]
    pub sweep_enabled: bool,

    /// Storage backend
    pub store: OtpStoreBackend,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 10,
            max_attempts: 5,
            resend_cooldown_seconds: 0,
            sweep_interval_seconds: 300,
            sweep_enabled: default_sweep_enabled(),
            store: OtpStoreBackend::Memory,
        }
    }
}

impl OtpConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_minutes: env_or("OTP_TTL_MINUTES", defaults.ttl_minutes),
            max_attempts: env_or("OTP_MAX_ATTEMPTS", defaults.max_attempts),
            resend_cooldown_seconds: env_or("OTP_RESEND_COOLDOWN_SECONDS", defaults.resend_cooldown_seconds),
            sweep_interval_seconds: env_or("OTP_SWEEP_INTERVAL_SECONDS", defaults.sweep_interval_seconds),
            sweep_enabled: env_or("OTP_SWEEP_ENABLED", defaults.sweep_enabled),
            store: env_or("OTP_STORE", defaults.store),
        }
    }

    /// Reject values that would make codes unusable or unbounded
    pub fn validate(&self) -> Result<(), String> {
        if self.ttl_minutes <= 0 {
            return Err(format!("OTP_TTL_MINUTES must be positive, got {}", self.ttl_minutes));
        }
        if self.max_attempts == 0 {
            return Err("OTP_MAX_ATTEMPTS must be at least 1".to_string());
        }
        if self.resend_cooldown_seconds < 0 {
            return Err("OTP_RESEND_COOLDOWN_SECONDS cannot be negative".to_string());
        }
        if self.sweep_enabled && self.sweep_interval_seconds == 0 {
            return Err("OTP_SWEEP_INTERVAL_SECONDS must be positive".to_string());
        }
        Ok(())
    }
}

fn default_sweep_enabled() -> bool {
    true
}
