//! Cache module for Redis-based storage
//!
//! This module provides the Redis client with retry logic and the Redis
//! implementation of `OtpStore`.

pub mod otp_store;
pub mod redis_client;

#[cfg(test)]
mod tests;

pub use otp_store::RedisOtpStore;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use cm_shared::config::CacheConfig;
