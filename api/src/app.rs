//! Application state and factory
//!
//! Builds the actix-web `App` around a shared `OtpManager`. The factory is
//! generic over the store and notifier so tests can plug in in-memory
//! implementations and the binary can pick a backend at startup.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use tracing_actix_web::TracingLogger;

use cm_core::{Notifier, OtpStore};
use cm_shared::config::CorsConfig;
use cm_shared::Environment;

use crate::handlers::json_error_handler;
use crate::middleware::{create_cors, SecurityMiddleware};
use crate::routes::health::{health_check, not_found};
use crate::routes::otp::{request_code, verify_code, AppState};

/// HTTP-level settings for the application factory
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub environment: Environment,
    pub cors: CorsConfig,
    pub max_payload_size: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            cors: CorsConfig::default(),
            max_payload_size: 16 * 1024,
        }
    }
}

/// Mounts the OTP routes on a scope
///
/// Split out so tests can mount the routes without the middleware stack.
pub fn configure_routes<S, N>(cfg: &mut web::ServiceConfig)
where
    S: OtpStore + 'static,
    N: Notifier + 'static,
{
    cfg.service(
        web::scope("/otp")
            .route("/request", web::post().to(request_code::<S, N>))
            .route("/verify", web::post().to(verify_code::<S, N>)),
    );
}

/// Create and configure the application with all dependencies
pub fn create_app<S, N>(
    app_state: web::Data<AppState<S, N>>,
    settings: &HttpSettings,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    S: OtpStore + 'static,
    N: Notifier + 'static,
{
    let json_config = web::JsonConfig::default()
        .limit(settings.max_payload_size)
        .error_handler(json_error_handler);

    App::new()
        .app_data(app_state)
        .app_data(json_config)
        // Registration order: security runs innermost, tracing outermost
        .wrap(SecurityMiddleware::new(settings.environment))
        .wrap(create_cors(settings.environment, &settings.cors))
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health_check::<S, N>))
        .service(web::scope("/api/v1").configure(configure_routes::<S, N>))
        .default_service(web::route().to(not_found))
}
