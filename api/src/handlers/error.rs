use actix_web::{
    error::{InternalError, JsonPayloadError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};

use cm_core::errors::{DomainError, OtpError};

use crate::dto::ErrorResponse;

/// Message shared by unknown and wrong codes so the two cannot be told apart
const INVALID_CODE_MESSAGE: &str = "Invalid verification code";

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse::new(error, message))
}

/// Handle domain errors and convert them to appropriate HTTP responses
pub fn handle_domain_error(error: DomainError) -> HttpResponse {
    match error {
        DomainError::Otp(otp_error) => handle_otp_error(otp_error),
        DomainError::Validation { message } => {
            tracing::warn!(reason = %message, "Rejected request");
            error_response(StatusCode::BAD_REQUEST, "invalid_input", message)
        }
        DomainError::Internal { message } => {
            tracing::error!(error = %message, "Internal error");
            internal_error()
        }
    }
}

fn handle_otp_error(error: OtpError) -> HttpResponse {
    match error {
        OtpError::InvalidInput { reason } => {
            error_response(StatusCode::BAD_REQUEST, "invalid_input", format!("Invalid request: {}", reason))
        }
        OtpError::NotFound | OtpError::Mismatch { .. } => {
            error_response(StatusCode::BAD_REQUEST, "invalid_verification_code", INVALID_CODE_MESSAGE)
        }
        OtpError::Expired => error_response(
            StatusCode::BAD_REQUEST,
            "verification_code_expired",
            "Verification code has expired. Please request a new one",
        ),
        OtpError::AttemptsExceeded => error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "max_attempts_exceeded",
            "Maximum verification attempts exceeded. Please request a new code",
        ),
        OtpError::ResendCooldown { retry_after_seconds } => HttpResponse::TooManyRequests()
            .insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()))
            .json(ErrorResponse::new(
                "resend_cooldown",
                format!("Please wait {} seconds before requesting a new code", retry_after_seconds),
            )),
        OtpError::Delivery { message } => {
            tracing::error!(error = %message, "Verification email could not be delivered");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "delivery_failure",
                "Failed to send verification email. Please try again later",
            )
        }
        OtpError::Storage { message } => {
            tracing::error!(error = %message, "Verification code storage failure");
            internal_error()
        }
    }
}

fn internal_error() -> HttpResponse {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "An internal error occurred")
}

/// Turns malformed JSON bodies into the standard `invalid_input` response
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(error = %err, "Malformed JSON payload");
    let response = error_response(StatusCode::BAD_REQUEST, "invalid_input", "Request body is not valid JSON");
    InternalError::from_response(err, response).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(response: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_rt::test]
    async fn test_status_mapping() {
        let cases = vec![
            (OtpError::InvalidInput { reason: "x".into() }, StatusCode::BAD_REQUEST, "invalid_input"),
            (OtpError::NotFound, StatusCode::BAD_REQUEST, "invalid_verification_code"),
            (OtpError::Mismatch { remaining_attempts: 2 }, StatusCode::BAD_REQUEST, "invalid_verification_code"),
            (OtpError::Expired, StatusCode::BAD_REQUEST, "verification_code_expired"),
            (OtpError::AttemptsExceeded, StatusCode::TOO_MANY_REQUESTS, "max_attempts_exceeded"),
            (OtpError::ResendCooldown { retry_after_seconds: 30 }, StatusCode::TOO_MANY_REQUESTS, "resend_cooldown"),
            (OtpError::Delivery { message: "smtp down".into() }, StatusCode::SERVICE_UNAVAILABLE, "delivery_failure"),
            (OtpError::Storage { message: "db down".into() }, StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        ];

        for (error, status, code) in cases {
            let response = handle_domain_error(error.into());
            assert_eq!(response.status(), status);
            assert_eq!(body_of(response).await["error"], code);
        }
    }

    #[actix_rt::test]
    async fn test_not_found_and_mismatch_are_indistinguishable() {
        let not_found = body_of(handle_domain_error(OtpError::NotFound.into())).await;
        let mismatch = body_of(handle_domain_error(OtpError::Mismatch { remaining_attempts: 4 }.into())).await;

        assert_eq!(not_found["error"], mismatch["error"]);
        assert_eq!(not_found["message"], mismatch["message"]);
        assert!(mismatch.get("details").is_none());
    }

    #[actix_rt::test]
    async fn test_internal_detail_is_not_exposed() {
        let response = handle_domain_error(OtpError::Storage { message: "mysql://root:pw@db".into() }.into());
        let body = body_of(response).await;
        assert!(!body.to_string().contains("mysql://"));

        let response = handle_domain_error(DomainError::Internal { message: "join error".into() });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_rt::test]
    async fn test_cooldown_sets_retry_after() {
        let response = handle_domain_error(OtpError::ResendCooldown { retry_after_seconds: 42 }.into());
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}
