//! Store trait defining the interface for outstanding one-time passwords.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::OtpRecord;
use crate::errors::DomainResult;

/// Outcome of a write that is gated on the code and the attempt budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedUpdate<T> {
    /// The record held the code and had budget left; the write happened
    Applied(T),
    /// The record holds the code but its failed attempts already reached the cap
    AttemptsExhausted,
    /// The record is gone or was replaced by a newer issuance
    Missing,
}

/// Keyed storage of at most one outstanding code per identifier
///
/// Every method must be atomic with respect to concurrent calls on the same
/// identifier. Implementations report failures as `OtpError::Storage`.
///
/// The compare-and-* methods take the code the caller observed so that a
/// record replaced by a newer issuance is never touched by a stale caller.
/// The guarded methods re-check the attempt budget inside the same atomic
/// step, so a caller holding an older copy of the record cannot overspend it.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Insert or replace the record for `record.identifier`
    async fn upsert(&self, record: &OtpRecord) -> DomainResult<()>;

    /// Fetch the current record, if any
    async fn get(&self, identifier: &str) -> DomainResult<Option<OtpRecord>>;

    /// Remove the record unconditionally
    ///
    /// # Returns
    /// * `Ok(true)` - A record was removed
    /// * `Ok(false)` - Nothing was stored for the identifier
    async fn delete(&self, identifier: &str) -> DomainResult<bool>;

    /// Remove the record only if it still holds `code`, ignoring attempts
    async fn delete_if_code(&self, identifier: &str, code: &str) -> DomainResult<bool>;

    /// Remove the record if it still holds `code` and has fewer than
    /// `max_attempts` failed attempts
    ///
    /// This is the single-use gate: of any number of concurrent callers with
    /// the same code, at most one observes `Applied`.
    async fn consume(
        &self,
        identifier: &str,
        code: &str,
        max_attempts: u32,
    ) -> DomainResult<GuardedUpdate<()>>;

    /// Increment the failed-attempt counter if the record still holds `code`
    /// and has fewer than `max_attempts` failed attempts
    ///
    /// # Returns
    /// * `Ok(Applied(attempts))` - The counter after incrementing
    /// * `Ok(AttemptsExhausted)` - The budget was already spent; nothing changed
    /// * `Ok(Missing)` - The record is gone or was replaced
    async fn increment_attempts(
        &self,
        identifier: &str,
        code: &str,
        max_attempts: u32,
    ) -> DomainResult<GuardedUpdate<u32>>;

    /// Remove every record with `expires_at <= now` and return how many went
    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<usize>;

    /// Round trip to the backing service, for readiness checks
    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }
}
