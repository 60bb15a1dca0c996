use actix_web::{web, HttpResponse};
use validator::Validate;

use cm_core::{Notifier, OtpStore};
use cm_shared::mask_email;

use crate::dto::{ApiResponse, ErrorResponse, RequestOtpRequest, RequestOtpResponse};
use crate::handlers::handle_domain_error;

use super::{invalid_fields, request_id, AppState};

/// Handler for POST /api/v1/otp/request
///
/// Issues a fresh code for the address and emails it. Any outstanding code
/// for the same address is replaced.
///
/// # Request Body
///
/// ```json
/// { "email": "student@campus.edu" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "success": true,
///     "data": {
///         "message": "OTP sent successfully",
///         "expires_in_seconds": 600
///     },
///     "timestamp": "2024-09-01T12:00:00Z",
///     "request_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: missing or invalid email
/// - 429 Too Many Requests: resend cooldown active
/// - 503 Service Unavailable: email could not be delivered
/// - 500 Internal Server Error: storage failure
pub async fn request_code<S, N>(
    state: web::Data<AppState<S, N>>,
    request: web::Json<RequestOtpRequest>,
) -> HttpResponse
where
    S: OtpStore + 'static,
    N: Notifier + 'static,
{
    if let Err(errors) = request.validate() {
        return HttpResponse::BadRequest().json(
            ErrorResponse::new("invalid_input", "Invalid request data")
                .with_detail("fields", invalid_fields(&errors)),
        );
    }

    match state.otp_manager.issue(&request.email).await {
        Ok(issued) => {
            tracing::debug!(email = %mask_email(&issued.identifier), "OTP request served");
            HttpResponse::Ok().json(
                ApiResponse::success(RequestOtpResponse {
                    message: "OTP sent successfully".to_string(),
                    expires_in_seconds: issued.expires_in_seconds(),
                })
                .with_request_id(request_id()),
            )
        }
        Err(error) => handle_domain_error(error),
    }
}
