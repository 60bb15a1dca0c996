pub mod otp;

pub use cm_shared::{ApiResponse, ErrorResponse};
pub use otp::{RequestOtpRequest, RequestOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
