//! CORS middleware configuration for cross-origin requests.
//!
//! The marketplace web client calls the OTP endpoints from its own origin.
//! Development accepts any origin; production only the configured ones.

use actix_cors::Cors;
use actix_web::http::{header, Method};

use cm_shared::config::CorsConfig;
use cm_shared::Environment;

/// Creates a CORS middleware instance for the given environment.
///
/// Outside production an empty `allowed_origins` list means any origin is
/// accepted. In production only the listed origins are.
pub fn create_cors(environment: Environment, config: &CorsConfig) -> Cors {
    if environment.is_production() {
        create_production_cors(config)
    } else {
        create_development_cors(config)
    }
}

fn create_development_cors(config: &CorsConfig) -> Cors {
    tracing::info!("Configuring CORS for development environment");

    let cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::HeaderName::from_static("x-requested-with"),
        ])
        .max_age(config.max_age)
        .supports_credentials();

    if config.allowed_origins.is_empty() {
        cors.allow_any_origin()
    } else {
        with_origins(cors, &config.allowed_origins)
    }
}

fn create_production_cors(config: &CorsConfig) -> Cors {
    tracing::info!(origins = config.allowed_origins.len(), "Configuring CORS for production environment");

    let cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(config.max_age);

    with_origins(cors, &config.allowed_origins)
}

fn with_origins(mut cors: Cors, origins: &[String]) -> Cors {
    for origin in origins {
        tracing::info!(origin = %origin, "Adding allowed origin");
        cors = cors.allowed_origin(origin);
    }
    cors
}
