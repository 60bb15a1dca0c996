//! One-time password record bound to an email address.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of the verification code
pub const CODE_LENGTH: usize = 6;

/// Default lifetime of a code (10 minutes)
pub const DEFAULT_TTL_MINUTES: i64 = 10;

/// Default number of failed attempts tolerated per code
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// The single outstanding code for an identifier
///
/// A record is created on every issuance and replaces any previous record for
/// the same identifier. It is deleted when verified, so there is no explicit
/// "used" flag.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Normalized email address the code was sent to
    pub identifier: String,

    /// The 6-digit verification code
    pub code: String,

    /// Timestamp when the code was issued
    pub issued_at: DateTime<Utc>,

    /// Timestamp when the code stops being accepted
    pub expires_at: DateTime<Utc>,

    /// Number of failed verification attempts against this code
    #[serde(default)]
    pub attempts: u32,
}

impl OtpRecord {
    /// Creates a record issued at `issued_at` that lives for `ttl`
    pub fn new(identifier: String, code: String, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            identifier,
            code,
            issued_at,
            expires_at: issued_at + ttl,
            attempts: 0,
        }
    }

    /// A code is usable only while `now < expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the failed-attempt budget is used up
    pub fn attempts_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }

    /// Seconds elapsed since issuance
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.issued_at).num_seconds()
    }
}

// The code is a secret; keep it out of debug output and therefore logs.
impl std::fmt::Debug for OtpRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpRecord")
            .field("identifier", &self.identifier)
            .field("code", &"******")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("attempts", &self.attempts)
            .finish()
    }
}
