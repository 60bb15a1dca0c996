//! HTTP surface of the Campus Market email verification service
//!
//! Exposed as a library so the application factory can be exercised by
//! integration tests.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use app::{configure_routes, create_app, HttpSettings};
pub use routes::otp::AppState;
