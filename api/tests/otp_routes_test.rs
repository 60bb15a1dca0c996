//! End-to-end tests for the OTP HTTP endpoints
//!
//! The full application factory is used with the in-memory store, a manual
//! clock and the mock mailer, so every status mapping can be driven
//! deterministically.

use std::sync::Arc;

use actix_web::{http::header, http::StatusCode, test, web};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use cm_api::{create_app, AppState, HttpSettings};
use cm_core::{
    DomainResult, GuardedUpdate, InMemoryOtpStore, ManualClock, OtpError, OtpManager,
    OtpManagerConfig, OtpRecord, OtpStore,
};
use cm_infra::email::{EmailNotifier, MockEmailService};

type State = web::Data<AppState<InMemoryOtpStore, EmailNotifier<MockEmailService>>>;

struct Fixture {
    state: State,
    mailer: Arc<MockEmailService>,
    clock: Arc<ManualClock>,
}

fn fixture(config: OtpManagerConfig) -> Fixture {
    let mailer = Arc::new(MockEmailService::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let manager = OtpManager::with_clock(
        Arc::new(InMemoryOtpStore::new()),
        Arc::new(EmailNotifier::new(mailer.clone())),
        config,
        clock.clone(),
    );

    Fixture {
        state: web::Data::new(AppState::new(Arc::new(manager))),
        mailer,
        clock,
    }
}

fn emailed_code(mailer: &MockEmailService, to: &str) -> String {
    let email = mailer.last_message_to(to).expect("verification email sent");
    email.body.chars().filter(|c| c.is_ascii_digit()).take(6).collect()
}

fn wrong_code(code: &str) -> &'static str {
    if code == "000000" {
        "111111"
    } else {
        "000000"
    }
}

fn request_otp(email: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/otp/request")
        .set_json(json!({ "email": email }))
}

fn verify_otp(email: &str, otp: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/otp/verify")
        .set_json(json!({ "email": email, "otp": otp }))
}

#[actix_rt::test]
async fn test_health_check() {
    let f = fixture(OtpManagerConfig::default());
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "campus-market-api");
    assert!(body["version"].is_string());
}

// Store whose backing service has gone away
struct UnreachableStore;

#[async_trait]
impl OtpStore for UnreachableStore {
    async fn upsert(&self, _record: &OtpRecord) -> DomainResult<()> {
        Err(OtpError::storage("connection refused").into())
    }

    async fn get(&self, _identifier: &str) -> DomainResult<Option<OtpRecord>> {
        Err(OtpError::storage("connection refused").into())
    }

    async fn delete(&self, _identifier: &str) -> DomainResult<bool> {
        Err(OtpError::storage("connection refused").into())
    }

    async fn delete_if_code(&self, _identifier: &str, _code: &str) -> DomainResult<bool> {
        Err(OtpError::storage("connection refused").into())
    }

    async fn consume(&self, _identifier: &str, _code: &str, _max: u32) -> DomainResult<GuardedUpdate<()>> {
        Err(OtpError::storage("connection refused").into())
    }

    async fn increment_attempts(
        &self,
        _identifier: &str,
        _code: &str,
        _max: u32,
    ) -> DomainResult<GuardedUpdate<u32>> {
        Err(OtpError::storage("connection refused").into())
    }

    async fn delete_expired(&self, _now: DateTime<Utc>) -> DomainResult<usize> {
        Err(OtpError::storage("connection refused").into())
    }

    async fn ping(&self) -> DomainResult<()> {
        Err(OtpError::storage("connection refused").into())
    }
}

#[actix_rt::test]
async fn test_health_check_reports_unreachable_store() {
    let manager = OtpManager::new(
        Arc::new(UnreachableStore),
        Arc::new(EmailNotifier::new(Arc::new(MockEmailService::new()))),
        OtpManagerConfig::default(),
    );
    let state = web::Data::new(AppState::new(Arc::new(manager)));
    let app = test::init_service(create_app(state, &HttpSettings::default())).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "unhealthy");
    assert!(!body.to_string().contains("connection refused"));
}

#[actix_rt::test]
async fn test_email_states_lifetime_from_manager_clock() {
    let mailer = Arc::new(MockEmailService::new());
    // Manager clock well away from the wall clock
    let clock = Arc::new(ManualClock::new(Utc::now() - Duration::days(30)));
    let manager = OtpManager::with_clock(
        Arc::new(InMemoryOtpStore::new()),
        Arc::new(EmailNotifier::new(mailer.clone())),
        OtpManagerConfig::default(),
        clock,
    );
    let state = web::Data::new(AppState::new(Arc::new(manager)));
    let app = test::init_service(create_app(state, &HttpSettings::default())).await;

    test::call_service(&app, request_otp("clock@campus.edu").to_request()).await;

    let email = mailer.last_message_to("clock@campus.edu").expect("verification email sent");
    assert!(email.body.contains("expire in 10 minutes"), "body was: {}", email.body);
}

#[actix_rt::test]
async fn test_unknown_route_returns_json_404() {
    let f = fixture(OtpManagerConfig::default());
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[actix_rt::test]
async fn test_request_then_verify() {
    let f = fixture(OtpManagerConfig::default());
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    let resp = test::call_service(&app, request_otp("Buyer@Campus.edu").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let raw = test::read_body(resp).await;
    let body: Value = serde_json::from_slice(&raw).unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["message"], "OTP sent successfully");
    assert_eq!(body["data"]["expires_in_seconds"], 600);
    assert!(body["request_id"].is_string());

    let code = emailed_code(&f.mailer, "buyer@campus.edu");
    assert!(!String::from_utf8_lossy(&raw).contains(&code));

    let resp = test::call_service(&app, verify_otp("buyer@campus.edu", &code).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let raw = test::read_body(resp).await;
    assert!(!String::from_utf8_lossy(&raw).contains(&code));

    let body: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(body["data"]["message"], "Email verified successfully");
    assert_eq!(body["data"]["email"], "buyer@campus.edu");
    assert!(body["data"]["verified_at"].is_string());
}

#[actix_rt::test]
async fn test_code_cannot_be_replayed() {
    let f = fixture(OtpManagerConfig::default());
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    test::call_service(&app, request_otp("a@campus.edu").to_request()).await;
    let code = emailed_code(&f.mailer, "a@campus.edu");

    let first = test::call_service(&app, verify_otp("a@campus.edu", &code).to_request()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = test::call_service(&app, verify_otp("a@campus.edu", &code).to_request()).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(second).await;
    assert_eq!(body["error"], "invalid_verification_code");
}

#[actix_rt::test]
async fn test_invalid_email_is_rejected() {
    let f = fixture(OtpManagerConfig::default());
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    for email in ["", "not-an-email"] {
        let resp = test::call_service(&app, request_otp(email).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_input");
    }
    assert_eq!(f.mailer.get_message_count(), 0);
}

#[actix_rt::test]
async fn test_malformed_json_is_invalid_input() {
    let f = fixture(OtpManagerConfig::default());
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/verify")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_input");
}

#[actix_rt::test]
async fn test_unknown_and_wrong_codes_look_the_same() {
    let f = fixture(OtpManagerConfig::default());
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    test::call_service(&app, request_otp("known@campus.edu").to_request()).await;
    let code = emailed_code(&f.mailer, "known@campus.edu");

    let wrong = test::call_service(&app, verify_otp("known@campus.edu", wrong_code(&code)).to_request()).await;
    let unknown = test::call_service(&app, verify_otp("never@campus.edu", "123456").to_request()).await;
    assert_eq!(wrong.status(), unknown.status());

    let wrong: Value = test::read_body_json(wrong).await;
    let unknown: Value = test::read_body_json(unknown).await;
    assert_eq!(wrong["error"], unknown["error"]);
    assert_eq!(wrong["message"], unknown["message"]);
    assert_eq!(wrong.as_object().unwrap().len(), unknown.as_object().unwrap().len());
}

#[actix_rt::test]
async fn test_expired_code() {
    let f = fixture(OtpManagerConfig::default());
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    test::call_service(&app, request_otp("late@campus.edu").to_request()).await;
    let code = emailed_code(&f.mailer, "late@campus.edu");

    f.clock.advance(Duration::minutes(11));

    let resp = test::call_service(&app, verify_otp("late@campus.edu", &code).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "verification_code_expired");
}

#[actix_rt::test]
async fn test_attempt_limit() {
    let config = OtpManagerConfig {
        max_attempts: 3,
        ..Default::default()
    };
    let f = fixture(config);
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    test::call_service(&app, request_otp("guess@campus.edu").to_request()).await;
    let code = emailed_code(&f.mailer, "guess@campus.edu");

    for _ in 0..3 {
        let resp = test::call_service(&app, verify_otp("guess@campus.edu", wrong_code(&code)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let resp = test::call_service(&app, verify_otp("guess@campus.edu", &code).to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "max_attempts_exceeded");
}

#[actix_rt::test]
async fn test_delivery_failure() {
    let f = fixture(OtpManagerConfig::default());
    f.mailer.set_simulate_failure(true);
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    let resp = test::call_service(&app, request_otp("offline@campus.edu").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "delivery_failure");

    // nothing was left behind to verify against
    let resp = test::call_service(&app, verify_otp("offline@campus.edu", "123456").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_verification_code");
}

#[actix_rt::test]
async fn test_resend_cooldown() {
    let config = OtpManagerConfig {
        resend_cooldown_seconds: 60,
        ..Default::default()
    };
    let f = fixture(config);
    let app = test::init_service(create_app(f.state, &HttpSettings::default())).await;

    let first = test::call_service(&app, request_otp("eager@campus.edu").to_request()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = test::call_service(&app, request_otp("eager@campus.edu").to_request()).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers().get(header::RETRY_AFTER).unwrap(), "60");
    let body: Value = test::read_body_json(second).await;
    assert_eq!(body["error"], "resend_cooldown");

    f.clock.advance(Duration::seconds(61));
    let third = test::call_service(&app, request_otp("eager@campus.edu").to_request()).await;
    assert_eq!(third.status(), StatusCode::OK);
}
