//! Redis OTP store tests against a live server

use chrono::{Duration, Utc};

use cm_core::domain::entities::OtpRecord;
use cm_core::repositories::{GuardedUpdate, OtpStore};
use cm_shared::config::CacheConfig;

use crate::cache::{RedisClient, RedisOtpStore};

async fn store() -> RedisOtpStore {
    let config = CacheConfig {
        url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        key_prefix: "cm_test".to_string(),
        ..Default::default()
    };
    RedisOtpStore::new(RedisClient::new(config).await.unwrap())
}

fn record(identifier: &str, code: &str) -> OtpRecord {
    OtpRecord::new(identifier.to_string(), code.to_string(), Utc::now(), Duration::minutes(10))
}

#[tokio::test]
#[ignore] // Requires actual Redis server
async fn test_compare_and_delete() {
    let store = store().await;
    let record = record("redis-cas@campus.edu", "222222");
    store.upsert(&record).await.unwrap();

    assert_eq!(store.get("redis-cas@campus.edu").await.unwrap(), Some(record));
    assert!(!store.delete_if_code("redis-cas@campus.edu", "111111").await.unwrap());
    assert!(store.delete_if_code("redis-cas@campus.edu", "222222").await.unwrap());
    assert!(store.get("redis-cas@campus.edu").await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires actual Redis server
async fn test_increment_attempts_keeps_record() {
    let store = store().await;
    let id = "redis-attempts@campus.edu";
    store.upsert(&record(id, "123456")).await.unwrap();

    assert_eq!(store.increment_attempts(id, "123456", 5).await.unwrap(), GuardedUpdate::Applied(1));
    assert_eq!(store.increment_attempts(id, "123456", 5).await.unwrap(), GuardedUpdate::Applied(2));
    assert_eq!(store.increment_attempts(id, "000000", 5).await.unwrap(), GuardedUpdate::Missing);

    let stored = store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.attempts, 2);
    assert!(store.delete(id).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires actual Redis server
async fn test_spent_budget_blocks_increment_and_consume() {
    let store = store().await;
    let id = "redis-capped@campus.edu";
    store.upsert(&record(id, "123456")).await.unwrap();

    assert_eq!(store.increment_attempts(id, "123456", 1).await.unwrap(), GuardedUpdate::Applied(1));
    assert_eq!(
        store.increment_attempts(id, "123456", 1).await.unwrap(),
        GuardedUpdate::AttemptsExhausted
    );
    assert_eq!(store.consume(id, "123456", 1).await.unwrap(), GuardedUpdate::AttemptsExhausted);
    assert_eq!(store.get(id).await.unwrap().unwrap().attempts, 1);

    assert_eq!(store.consume(id, "123456", 5).await.unwrap(), GuardedUpdate::Applied(()));
    assert_eq!(store.consume(id, "123456", 5).await.unwrap(), GuardedUpdate::Missing);
}
