//! Delivery seam for issued codes

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Out-of-band delivery of a code to its owner
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `code` to `identifier`; returns a provider delivery id
    ///
    /// Both timestamps come from the manager's clock, so any lifetime shown
    /// to the recipient should be derived from them rather than the wall clock.
    async fn send(
        &self,
        identifier: &str,
        code: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, String>;
}
