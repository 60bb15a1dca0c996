//! Main OTP manager implementation

use cm_shared::{is_valid_email, mask_email, normalize_email};
use constant_time_eq::constant_time_eq;
use std::sync::Arc;

use crate::domain::entities::OtpRecord;
use crate::errors::{DomainError, DomainResult, OtpError};
use crate::repositories::{GuardedUpdate, OtpStore};

use super::clock::{Clock, SystemClock};
use super::code::generate_code;
use super::config::OtpManagerConfig;
use super::traits::Notifier;
use super::types::{IssuedCode, VerifiedIdentity};

/// Issues and verifies email one-time passwords
///
/// The manager itself is stateless; every piece of state lives in the store,
/// so one instance can be shared across all request handlers.
pub struct OtpManager<S: OtpStore, N: Notifier> {
    store: Arc<S>,
    notifier: Arc<N>,
    config: OtpManagerConfig,
    clock: Arc<dyn Clock>,
}

impl<S: OtpStore, N: Notifier> OtpManager<S, N> {
    /// Create a manager that reads the wall clock
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: OtpManagerConfig) -> Self {
        Self::with_clock(store, notifier, config, Arc::new(SystemClock))
    }

    /// Create a manager with an explicit time source
    pub fn with_clock(
        store: Arc<S>,
        notifier: Arc<N>,
        config: OtpManagerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &OtpManagerConfig {
        &self.config
    }

    /// Issue a fresh code for `identifier` and deliver it
    ///
    /// This method:
    /// 1. Normalizes and validates the email address
    /// 2. Enforces the resend cooldown, when one is configured
    /// 3. Generates a code and persists it, replacing any previous code
    /// 4. Hands the code to the notifier
    ///
    /// If delivery fails the stored record is removed again, unless a newer
    /// issuance already replaced it, and `OtpError::Delivery` is returned.
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedCode)` - The code was stored and delivered
    /// * `Err(DomainError)` - `InvalidInput`, `ResendCooldown`, `Storage` or `Delivery`
    pub async fn issue(&self, identifier: &str) -> DomainResult<IssuedCode> {
        let identifier = Self::normalize(identifier)?;
        let masked = mask_email(&identifier);
        let now = self.clock.now();

        if self.config.resend_cooldown_seconds > 0 {
            let existing = self.store.get(&identifier).await.map_err(|e| {
                tracing::error!(email = %masked, error = %e, event = "otp_lookup_failed", "Failed to read OTP store");
                e.into_storage()
            })?;

            if let Some(existing) = existing.filter(|r| !r.is_expired_at(now)) {
                let cooldown = self.config.resend_cooldown_seconds;
                let elapsed = existing.age_seconds(now);
                if elapsed < cooldown {
                    let retry_after_seconds = (cooldown - elapsed).clamp(1, cooldown);
                    tracing::warn!(
                        email = %masked,
                        retry_after_seconds,
                        event = "otp_resend_cooldown",
                        "Verification code requested during cooldown"
                    );
                    return Err(OtpError::ResendCooldown { retry_after_seconds }.into());
                }
            }
        }

        let record = OtpRecord::new(identifier.clone(), generate_code(), now, self.config.ttl());

        self.store.upsert(&record).await.map_err(|e| {
            tracing::error!(email = %masked, error = %e, event = "otp_storage_failed", "Failed to store verification code");
            e.into_storage()
        })?;

        match self
            .notifier
            .send(&identifier, &record.code, record.issued_at, record.expires_at)
            .await
        {
            Ok(delivery_id) => {
                tracing::info!(
                    email = %masked,
                    delivery_id = %delivery_id,
                    expires_at = %record.expires_at,
                    event = "otp_issued",
                    "Verification code issued"
                );

                Ok(IssuedCode {
                    identifier,
                    code: record.code,
                    issued_at: record.issued_at,
                    expires_at: record.expires_at,
                    delivery_id,
                })
            }
            Err(message) => {
                tracing::error!(email = %masked, error = %message, event = "otp_delivery_failed", "Failed to deliver verification code");

                // Leave a newer code alone if one was issued meanwhile
                if let Err(e) = self.store.delete_if_code(&identifier, &record.code).await {
                    tracing::error!(email = %masked, error = %e, event = "otp_rollback_failed", "Failed to remove undelivered code");
                }

                Err(OtpError::Delivery { message }.into())
            }
        }
    }

    /// Check `submitted` against the outstanding code for `identifier`
    ///
    /// A matching code is consumed; a wrong code counts against the
    /// attempt budget of the record. Format is not checked up front so a
    /// malformed submission is just another mismatch.
    ///
    /// # Returns
    ///
    /// * `Ok(VerifiedIdentity)` - The code matched and has been consumed
    /// * `Err(DomainError)` - `InvalidInput`, `NotFound`, `Expired`,
    ///   `AttemptsExceeded`, `Mismatch` or `Storage`
    pub async fn verify(&self, identifier: &str, submitted: &str) -> DomainResult<VerifiedIdentity> {
        let identifier = Self::normalize(identifier)?;
        let masked = mask_email(&identifier);
        let now = self.clock.now();

        let record = match self.store.get(&identifier).await.map_err(|e| {
            tracing::error!(email = %masked, error = %e, event = "otp_lookup_failed", "Failed to read OTP store");
            e.into_storage()
        })? {
            Some(record) => record,
            None => {
                tracing::info!(email = %masked, event = "otp_not_found", "No outstanding verification code");
                return Err(OtpError::NotFound.into());
            }
        };

        if record.is_expired_at(now) {
            tracing::info!(email = %masked, event = "otp_expired", "Verification code expired");
            return Err(OtpError::Expired.into());
        }

        let max_attempts = self.config.max_attempts;
        if record.attempts_exhausted(max_attempts) {
            return Err(Self::attempts_exceeded(&masked));
        }

        if !constant_time_eq(submitted.as_bytes(), record.code.as_bytes()) {
            let outcome = self
                .store
                .increment_attempts(&identifier, &record.code, max_attempts)
                .await
                .map_err(|e| {
                    tracing::error!(email = %masked, error = %e, event = "otp_storage_failed", "Failed to record attempt");
                    e.into_storage()
                })?;

            return match outcome {
                GuardedUpdate::Applied(attempts) => {
                    let remaining_attempts = max_attempts.saturating_sub(attempts);
                    tracing::warn!(
                        email = %masked,
                        remaining_attempts,
                        event = "otp_mismatch",
                        "Verification code mismatch"
                    );
                    Err(OtpError::Mismatch { remaining_attempts }.into())
                }
                GuardedUpdate::AttemptsExhausted => Err(Self::attempts_exceeded(&masked)),
                // Consumed or replaced since we read it
                GuardedUpdate::Missing => Err(OtpError::NotFound.into()),
            };
        }

        match self
            .store
            .consume(&identifier, &record.code, max_attempts)
            .await
            .map_err(|e| {
                tracing::error!(email = %masked, error = %e, event = "otp_storage_failed", "Failed to consume verification code");
                e.into_storage()
            })? {
            GuardedUpdate::Applied(()) => {}
            // Concurrent wrong guesses spent the budget after our read
            GuardedUpdate::AttemptsExhausted => return Err(Self::attempts_exceeded(&masked)),
            GuardedUpdate::Missing => {
                tracing::info!(email = %masked, event = "otp_consume_raced", "Verification code already consumed or replaced");
                return Err(OtpError::NotFound.into());
            }
        }

        tracing::info!(email = %masked, event = "otp_verified", "Verification code verified");

        Ok(VerifiedIdentity {
            identifier,
            verified_at: now,
        })
    }

    /// Remove every record whose expiry is at or before now
    pub async fn purge_expired(&self) -> DomainResult<usize> {
        self.store
            .delete_expired(self.clock.now())
            .await
            .map_err(DomainError::into_storage)
    }

    /// Whether the store can currently be reached
    pub async fn check_store(&self) -> DomainResult<()> {
        self.store.ping().await.map_err(|e| {
            tracing::error!(error = %e, event = "otp_store_unreachable", "OTP store health check failed");
            e.into_storage()
        })
    }

    /// Drop the outstanding code for `identifier`, if any
    pub async fn revoke(&self, identifier: &str) -> DomainResult<bool> {
        let identifier = Self::normalize(identifier)?;
        let removed = self
            .store
            .delete(&identifier)
            .await
            .map_err(DomainError::into_storage)?;

        if removed {
            tracing::info!(email = %mask_email(&identifier), event = "otp_revoked", "Verification code revoked");
        }
        Ok(removed)
    }

    fn attempts_exceeded(masked: &str) -> DomainError {
        tracing::warn!(email = %masked, event = "otp_attempts_exceeded", "Verification attempts exhausted");
        OtpError::AttemptsExceeded.into()
    }

    fn normalize(identifier: &str) -> DomainResult<String> {
        let identifier = normalize_email(identifier);

        if identifier.is_empty() {
            return Err(OtpError::InvalidInput {
                reason: "email address is required".to_string(),
            }
            .into());
        }

        if !is_valid_email(&identifier) {
            return Err(OtpError::InvalidInput {
                reason: "email address is not valid".to_string(),
            }
            .into());
        }

        Ok(identifier)
    }
}
