//! Type definitions shared by the API layer
//!
//! - `response` - API response wrappers and health checks

pub mod response;

pub use response::{ApiResponse, ErrorResponse, HealthResponse, HealthStatus};
