//! Redis implementation of the OtpStore trait
//!
//! Each record is one JSON value under `{prefix}:otp:{identifier}`, written
//! with `SET ... EX` so Redis drops it on expiry. The compare-and-* operations
//! run as Lua scripts and are therefore atomic on the server; the guarded ones
//! check the attempt budget inside the script.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use redis::Script;
use tracing::debug;

use cm_core::domain::entities::OtpRecord;
use cm_core::errors::{DomainResult, OtpError};
use cm_core::repositories::{GuardedUpdate, OtpStore};

use super::redis_client::RedisClient;

// Returns 1 when the stored record held ARGV[1] and was deleted
static DELETE_IF_CODE: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local raw = redis.call('GET', KEYS[1])
        if not raw then return 0 end
        local record = cjson.decode(raw)
        if record.code ~= ARGV[1] then return 0 end
        redis.call('DEL', KEYS[1])
        return 1
        "#,
    )
});

// Refusals returned by the guarded scripts
const EXHAUSTED: i64 = -2;
const MISSING: i64 = -1;

// Returns 1 when the record held ARGV[1] with budget left and was deleted
static CONSUME: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local raw = redis.call('GET', KEYS[1])
        if not raw then return -1 end
        local record = cjson.decode(raw)
        if record.code ~= ARGV[1] then return -1 end
        if (record.attempts or 0) >= tonumber(ARGV[2]) then return -2 end
        redis.call('DEL', KEYS[1])
        return 1
        "#,
    )
});

// Returns the new attempt count, -1 when the record is gone or replaced,
// -2 when the budget in ARGV[2] is already spent
static INCREMENT_ATTEMPTS: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local raw = redis.call('GET', KEYS[1])
        if not raw then return -1 end
        local record = cjson.decode(raw)
        if record.code ~= ARGV[1] then return -1 end
        local attempts = record.attempts or 0
        if attempts >= tonumber(ARGV[2]) then return -2 end
        record.attempts = attempts + 1
        redis.call('SET', KEYS[1], cjson.encode(record), 'KEEPTTL')
        return record.attempts
        "#,
    )
});

/// Redis-backed OTP store
pub struct RedisOtpStore {
    client: RedisClient,
}

impl RedisOtpStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn key(&self, identifier: &str) -> String {
        self.client.config().key(&["otp", identifier])
    }

    /// Seconds Redis should keep the record; never below one
    fn ttl_seconds(record: &OtpRecord) -> u64 {
        (record.expires_at - record.issued_at).num_seconds().max(1) as u64
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn upsert(&self, record: &OtpRecord) -> DomainResult<()> {
        let payload = serde_json::to_string(record).map_err(OtpError::storage)?;

        self.client
            .set_with_expiry(&self.key(&record.identifier), &payload, Self::ttl_seconds(record))
            .await?;
        Ok(())
    }

    async fn get(&self, identifier: &str) -> DomainResult<Option<OtpRecord>> {
        match self.client.get(&self.key(identifier)).await? {
            Some(payload) => {
                let record = serde_json::from_str(&payload).map_err(OtpError::storage)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, identifier: &str) -> DomainResult<bool> {
        Ok(self.client.delete(&self.key(identifier)).await?)
    }

    async fn delete_if_code(&self, identifier: &str, code: &str) -> DomainResult<bool> {
        let deleted: i64 = self
            .client
            .run_script(&DELETE_IF_CODE, &self.key(identifier), &[code.to_string()])
            .await?;
        Ok(deleted == 1)
    }

    async fn consume(
        &self,
        identifier: &str,
        code: &str,
        max_attempts: u32,
    ) -> DomainResult<GuardedUpdate<()>> {
        let reply: i64 = self
            .client
            .run_script(
                &CONSUME,
                &self.key(identifier),
                &[code.to_string(), max_attempts.to_string()],
            )
            .await?;

        Ok(match reply {
            EXHAUSTED => GuardedUpdate::AttemptsExhausted,
            MISSING => GuardedUpdate::Missing,
            _ => GuardedUpdate::Applied(()),
        })
    }

    async fn increment_attempts(
        &self,
        identifier: &str,
        code: &str,
        max_attempts: u32,
    ) -> DomainResult<GuardedUpdate<u32>> {
        let reply: i64 = self
            .client
            .run_script(
                &INCREMENT_ATTEMPTS,
                &self.key(identifier),
                &[code.to_string(), max_attempts.to_string()],
            )
            .await?;

        Ok(match reply {
            EXHAUSTED => GuardedUpdate::AttemptsExhausted,
            attempts if attempts < 0 => GuardedUpdate::Missing,
            attempts => GuardedUpdate::Applied(u32::try_from(attempts).unwrap_or(u32::MAX)),
        })
    }

    async fn delete_expired(&self, _now: DateTime<Utc>) -> DomainResult<usize> {
        // Keys carry their own TTL
        debug!("Redis expires OTP keys natively; nothing to purge");
        Ok(0)
    }

    async fn ping(&self) -> DomainResult<()> {
        if self.client.ping().await? {
            Ok(())
        } else {
            Err(OtpError::storage("Redis answered PING unexpectedly").into())
        }
    }
}
