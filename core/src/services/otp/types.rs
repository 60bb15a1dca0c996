//! Types for OTP manager results

use chrono::{DateTime, Utc};

/// Result of issuing a code
#[derive(Clone)]
pub struct IssuedCode {
    /// Normalized identifier the code was bound to
    pub identifier: String,
    /// The code that was delivered; never echo this to the requester
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Delivery id reported by the notifier
    pub delivery_id: String,
}

impl IssuedCode {
    /// Whole seconds between issuance and expiry
    pub fn expires_in_seconds(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

impl std::fmt::Debug for IssuedCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCode")
            .field("identifier", &self.identifier)
            .field("code", &"******")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("delivery_id", &self.delivery_id)
            .finish()
    }
}

/// Proof that an identifier was verified at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub identifier: String,
    pub verified_at: DateTime<Utc>,
}
