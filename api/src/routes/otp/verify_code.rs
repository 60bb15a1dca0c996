use actix_web::{web, HttpResponse};
use validator::Validate;

use cm_core::{Notifier, OtpStore};

use crate::dto::{ApiResponse, ErrorResponse, VerifyOtpRequest, VerifyOtpResponse};
use crate::handlers::handle_domain_error;

use super::{invalid_fields, request_id, AppState};

/// Handler for POST /api/v1/otp/verify
///
/// Redeems a code. A successful verification consumes it.
///
/// # Request Body
///
/// ```json
/// { "email": "student@campus.edu", "otp": "123456" }
/// ```
///
/// ## Errors
/// - 400 Bad Request: invalid input, wrong or unknown code, expired code
/// - 429 Too Many Requests: too many wrong attempts
/// - 500 Internal Server Error: storage failure
pub async fn verify_code<S, N>(
    state: web::Data<AppState<S, N>>,
    request: web::Json<VerifyOtpRequest>,
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

    match state.otp_manager.verify(&request.email, &request.otp).await {
        Ok(verified) => HttpResponse::Ok().json(
            ApiResponse::success(VerifyOtpResponse {
                message: "Email verified successfully".to_string(),
                email: verified.identifier,
                verified_at: verified.verified_at,
            })
            .with_request_id(request_id()),
        ),
        Err(error) => handle_domain_error(error),
    }
}
