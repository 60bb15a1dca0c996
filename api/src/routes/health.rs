use actix_web::{web, HttpResponse};
use chrono::Utc;

use cm_core::{Notifier, OtpStore};
use cm_shared::{HealthResponse, HealthStatus};

use super::otp::AppState;

pub const SERVICE_NAME: &str = "campus-market-api";

/// Health check endpoint handler
///
/// Reports `unhealthy` with 503 while the OTP store cannot be reached.
pub async fn health_check<S, N>(state: web::Data<AppState<S, N>>) -> HttpResponse
where
    S: OtpStore + 'static,
    N: Notifier + 'static,
{
    let status = match state.otp_manager.check_store().await {
        Ok(()) => HealthStatus::Healthy,
        Err(_) => HealthStatus::Unhealthy,
    };

    let body = HealthResponse {
        status,
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    };

    match status {
        HealthStatus::Healthy => HttpResponse::Ok().json(body),
        _ => HttpResponse::ServiceUnavailable().json(body),
    }
}

/// Default 404 handler
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(cm_shared::ErrorResponse::new(
        "not_found",
        "The requested resource was not found",
    ))
}
