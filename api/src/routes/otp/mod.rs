//! Email verification routes
//!
//! - `POST /api/v1/otp/request` - issue a code and email it
//! - `POST /api/v1/otp/verify` - redeem a code

pub mod request_code;
pub mod verify_code;

use std::sync::Arc;

use cm_core::{Notifier, OtpManager, OtpStore};

pub use request_code::request_code;
pub use verify_code::verify_code;

/// Application state that holds shared services
pub struct AppState<S, N>
where
    S: OtpStore,
    N: Notifier,
{
    pub otp_manager: Arc<OtpManager<S, N>>,
}

impl<S: OtpStore, N: Notifier> AppState<S, N> {
    pub fn new(otp_manager: Arc<OtpManager<S, N>>) -> Self {
        Self { otp_manager }
    }
}

/// Request id attached to every success envelope
pub(crate) fn request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Names of the fields that failed validation
///
/// Field values are left out so a submitted code never appears in a response.
pub(crate) fn invalid_fields(errors: &validator::ValidationErrors) -> serde_json::Value {
    let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
    fields.sort_unstable();
    serde_json::json!(fields)
}
