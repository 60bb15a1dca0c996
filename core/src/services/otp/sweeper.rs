//! Background sweep of expired verification codes
//!
//! Expired records are already rejected by `verify`; the sweep only keeps
//! the store from growing with codes nobody came back for.

use cm_shared::OtpConfig;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::OtpStore;

use super::service::OtpManager;
use super::traits::Notifier;

/// Configuration for the expiry sweep
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often to run the sweep (in seconds)
    pub interval_seconds: u64,
    /// Whether to run the sweep at all
    pub enabled: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            enabled: true,
        }
    }
}

impl From<&OtpConfig> for SweepConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            interval_seconds: config.sweep_interval_seconds,
            enabled: config.sweep_enabled,
        }
    }
}

/// Periodically purges expired codes through the manager
pub struct OtpSweeper<S: OtpStore + 'static, N: Notifier + 'static> {
    manager: Arc<OtpManager<S, N>>,
    config: SweepConfig,
}

impl<S: OtpStore + 'static, N: Notifier + 'static> OtpSweeper<S, N> {
    pub fn new(manager: Arc<OtpManager<S, N>>, config: SweepConfig) -> Self {
        Self { manager, config }
    }

    /// Run a single sweep cycle
    pub async fn run_once(&self) -> SweepResult {
        let mut result = SweepResult::default();

        match self.manager.purge_expired().await {
            Ok(count) => {
                result.purged = count;
                if count > 0 {
                    info!(purged = count, event = "otp_sweep", "Purged expired verification codes");
                }
            }
            Err(e) => {
                error!(error = %e, event = "otp_sweep_failed", "Failed to purge expired verification codes");
                result.errors.push(format!("Sweep error: {}", e));
            }
        }

        result
    }

    /// Start the sweep as a background task
    ///
    /// The first cycle runs immediately. Returns a handle that stops the task;
    /// when the sweep is disabled the handle is inert.
    pub fn start(self: Arc<Self>) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        if !self.config.enabled {
            warn!("OTP expiry sweep is disabled");
            return SweeperHandle {
                shutdown_tx,
                task: None,
            };
        }

        let period = std::time::Duration::from_secs(self.config.interval_seconds.max(1));

        let task = tokio::spawn(async move {
            info!(
                interval_seconds = self.config.interval_seconds,
                "OTP expiry sweep started"
            );

            let mut interval = tokio::time::interval(period);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.run_once().await.warn_on_errors();
                    }
                    changed = shutdown_rx.changed() => {
                        // A dropped sender also means stop
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("OTP expiry sweep stopped");
        });

        SweeperHandle {
            shutdown_tx,
            task: Some(task),
        }
    }
}

/// Handle used to stop a running sweep
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Signal the task to stop and wait for it to finish
    pub async fn shutdown(self) -> Result<(), DomainError> {
        let _ = self.shutdown_tx.send(true);

        if let Some(task) = self.task {
            task.await.map_err(|e| DomainError::Internal {
                message: format!("Sweep task failed: {}", e),
            })?;
        }
        Ok(())
    }
}

/// Result of a sweep cycle
#[derive(Debug, Default)]
pub struct SweepResult {
    /// Number of expired records removed
    pub purged: usize,
    /// Any errors encountered during the sweep
    pub errors: Vec<String>,
}

impl SweepResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn warn_on_errors(&self) {
        if !self.is_success() {
            warn!(errors = ?self.errors, event = "otp_sweep_incomplete", "Sweep completed with errors");
        }
    }
}
