//! Process-local OTP store backed by a mutex-guarded map

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::entities::OtpRecord;
use crate::errors::DomainResult;

use super::r#trait::{GuardedUpdate, OtpStore};

/// In-memory store for development, tests and single-instance deployments
///
/// Records do not survive a restart. A single lock covers the whole map so
/// every operation is trivially atomic per identifier.
pub struct InMemoryOtpStore {
    records: Mutex<HashMap<String, OtpRecord>>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored records, expired ones included
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl Default for InMemoryOtpStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn upsert(&self, record: &OtpRecord) -> DomainResult<()> {
        let mut records = self.records.lock().await;
        records.insert(record.identifier.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, identifier: &str) -> DomainResult<Option<OtpRecord>> {
        let records = self.records.lock().await;
        Ok(records.get(identifier).cloned())
    }

    async fn delete(&self, identifier: &str) -> DomainResult<bool> {
        let mut records = self.records.lock().await;
        Ok(records.remove(identifier).is_some())
    }

    async fn delete_if_code(&self, identifier: &str, code: &str) -> DomainResult<bool> {
        let mut records = self.records.lock().await;

        match records.get(identifier) {
            Some(record) if record.code == code => {
                records.remove(identifier);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn consume(
        &self,
        identifier: &str,
        code: &str,
        max_attempts: u32,
    ) -> DomainResult<GuardedUpdate<()>> {
        let mut records = self.records.lock().await;

        match records.get(identifier) {
            Some(record) if record.code == code => {
                if record.attempts_exhausted(max_attempts) {
                    return Ok(GuardedUpdate::AttemptsExhausted);
                }
                records.remove(identifier);
                Ok(GuardedUpdate::Applied(()))
            }
            _ => Ok(GuardedUpdate::Missing),
        }
    }

    async fn increment_attempts(
        &self,
        identifier: &str,
        code: &str,
        max_attempts: u32,
    ) -> DomainResult<GuardedUpdate<u32>> {
        let mut records = self.records.lock().await;

        match records.get_mut(identifier) {
            Some(record) if record.code == code => {
                if record.attempts_exhausted(max_attempts) {
                    return Ok(GuardedUpdate::AttemptsExhausted);
                }
                record.attempts = record.attempts.saturating_add(1);
                Ok(GuardedUpdate::Applied(record.attempts))
            }
            _ => Ok(GuardedUpdate::Missing),
        }
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        Ok(before - records.len())
    }
}
