//! MySQL implementation of the OtpStore trait.
//!
//! One row per identifier in `otp_codes`. Every write maps to a single
//! statement (or a row-locked transaction for the attempt counter) so the
//! per-identifier atomicity the manager relies on comes from InnoDB. The
//! attempt cap is part of each guarded statement's predicate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use tracing::{debug, error};

use cm_core::domain::entities::OtpRecord;
use cm_core::errors::{DomainResult, OtpError};
use cm_core::repositories::{GuardedUpdate, OtpStore};

/// MySQL implementation of OtpStore
pub struct MySqlOtpStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlOtpStore {
    /// Create a new MySQL OTP store
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to OtpRecord entity
    fn row_to_record(row: &sqlx::mysql::MySqlRow) -> DomainResult<OtpRecord> {
        Ok(OtpRecord {
            identifier: row.try_get("identifier").map_err(|e| Self::column_error("identifier", e))?,
            code: row.try_get("code").map_err(|e| Self::column_error("code", e))?,
            issued_at: row
                .try_get::<DateTime<Utc>, _>("issued_at")
                .map_err(|e| Self::column_error("issued_at", e))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| Self::column_error("expires_at", e))?,
            attempts: row.try_get("attempts").map_err(|e| Self::column_error("attempts", e))?,
        })
    }

    /// Why a guarded delete matched no row: the code is still stored with a
    /// spent budget, or the record is gone
    async fn refusal_reason(&self, identifier: &str, code: &str) -> DomainResult<GuardedUpdate<()>> {
        let still_stored = sqlx::query("SELECT 1 FROM otp_codes WHERE identifier = ? AND code = ?")
            .bind(identifier)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::query_error("load verification code", e))?;

        Ok(match still_stored {
            Some(_) => GuardedUpdate::AttemptsExhausted,
            None => GuardedUpdate::Missing,
        })
    }

    fn column_error(column: &str, e: sqlx::Error) -> cm_core::errors::DomainError {
        OtpError::storage(format!("Failed to get {}: {}", column, e)).into()
    }

    fn query_error(action: &str, e: sqlx::Error) -> cm_core::errors::DomainError {
        error!(error = %e, "Failed to {}", action);
        OtpError::storage(format!("Failed to {}: {}", action, e)).into()
    }
}

#[async_trait]
impl OtpStore for MySqlOtpStore {
    async fn upsert(&self, record: &OtpRecord) -> DomainResult<()> {
        let query = r#"
            INSERT INTO otp_codes (identifier, code, issued_at, expires_at, attempts)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                code = VALUES(code),
                issued_at = VALUES(issued_at),
                expires_at = VALUES(expires_at),
                attempts = VALUES(attempts)
        "#;

        sqlx::query(query)
            .bind(&record.identifier)
            .bind(&record.code)
            .bind(record.issued_at)
            .bind(record.expires_at)
            .bind(record.attempts)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::query_error("store verification code", e))?;

        Ok(())
    }

    async fn get(&self, identifier: &str) -> DomainResult<Option<OtpRecord>> {
        let query = r#"
            SELECT identifier, code, issued_at, expires_at, attempts
            FROM otp_codes
            WHERE identifier = ?
        "#;

        let row = sqlx::query(query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::query_error("load verification code", e))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn delete(&self, identifier: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE identifier = ?")
            .bind(identifier)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::query_error("delete verification code", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_if_code(&self, identifier: &str, code: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE identifier = ? AND code = ?")
            .bind(identifier)
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::query_error("consume verification code", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn consume(
        &self,
        identifier: &str,
        code: &str,
        max_attempts: u32,
    ) -> DomainResult<GuardedUpdate<()>> {
        let result = sqlx::query(
            "DELETE FROM otp_codes WHERE identifier = ? AND code = ? AND attempts < ?",
        )
        .bind(identifier)
        .bind(code)
        .bind(max_attempts)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::query_error("consume verification code", e))?;

        if result.rows_affected() > 0 {
            return Ok(GuardedUpdate::Applied(()));
        }
        self.refusal_reason(identifier, code).await
    }

    async fn increment_attempts(
        &self,
        identifier: &str,
        code: &str,
        max_attempts: u32,
    ) -> DomainResult<GuardedUpdate<u32>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Self::query_error("begin transaction", e))?;

        // Row lock keeps concurrent increments serialized
        let row = sqlx::query(
            "SELECT attempts FROM otp_codes WHERE identifier = ? AND code = ? FOR UPDATE",
        )
        .bind(identifier)
        .bind(code)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| Self::query_error("lock verification code", e))?;

        let attempts: u32 = match row {
            Some(row) => row.try_get("attempts").map_err(|e| Self::column_error("attempts", e))?,
            None => {
                tx.rollback()
                    .await
                    .map_err(|e| Self::query_error("roll back transaction", e))?;
                return Ok(GuardedUpdate::Missing);
            }
        };

        if attempts >= max_attempts {
            tx.rollback()
                .await
                .map_err(|e| Self::query_error("roll back transaction", e))?;
            return Ok(GuardedUpdate::AttemptsExhausted);
        }

        sqlx::query(
            "UPDATE otp_codes SET attempts = attempts + 1 WHERE identifier = ? AND code = ? AND attempts < ?",
        )
        .bind(identifier)
        .bind(code)
        .bind(max_attempts)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::query_error("record verification attempt", e))?;

        tx.commit()
            .await
            .map_err(|e| Self::query_error("commit transaction", e))?;

        Ok(GuardedUpdate::Applied(attempts.saturating_add(1)))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::query_error("purge expired verification codes", e))?;

        let purged = result.rows_affected() as usize;
        debug!(purged, "Purged expired verification codes from MySQL");
        Ok(purged)
    }

    async fn ping(&self) -> DomainResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Self::query_error("reach database", e))?;
        Ok(())
    }
}
