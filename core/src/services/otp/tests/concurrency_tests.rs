//! Concurrent issue and verify against the in-memory store

use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::{DomainError, OtpError};
use crate::repositories::OtpStore;
use crate::services::otp::{ManualClock, OtpManager, OtpManagerConfig};

use super::mocks::{harness, t0, MockNotifier, YieldingStore};

const EMAIL: &str = "student@campus.edu";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_leaves_single_record() {
    let h = harness(OtpManagerConfig::default());

    let mut handles = Vec::new();
    for _ in 0..50 {
        let manager = h.manager.clone();
        handles.push(tokio::spawn(async move { manager.issue(EMAIL).await.unwrap() }));
    }

    let mut issued = HashSet::new();
    for handle in handles {
        issued.insert(handle.await.unwrap().code);
    }

    assert_eq!(h.store.len().await, 1);

    // Whatever won the race is one of the issued codes and still verifies
    let stored = h.store.get(EMAIL).await.unwrap().unwrap();
    assert!(issued.contains(&stored.code));
    assert!(h.manager.verify(EMAIL, &stored.code).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verify_succeeds_once() {
    let h = harness(OtpManagerConfig::default());
    let issued = h.manager.issue(EMAIL).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let manager = h.manager.clone();
        let code = issued.code.clone();
        handles.push(tokio::spawn(async move { manager.verify(EMAIL, &code).await }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(DomainError::Otp(OtpError::NotFound)) => {}
            Err(other) => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(successes, 1);
    assert!(h.store.is_empty().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identifiers_are_independent() {
    let h = harness(OtpManagerConfig::default());

    let mut handles = Vec::new();
    for i in 0..25 {
        let manager = h.manager.clone();
        handles.push(tokio::spawn(async move {
            let email = format!("user{}@campus.edu", i);
            let issued = manager.issue(&email).await.unwrap();
            manager.verify(&email, &issued.code).await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_racing_guesses_cannot_overspend_budget() {
    let store = Arc::new(YieldingStore::default());
    let notifier = Arc::new(MockNotifier::new(false));
    let config = OtpManagerConfig {
        max_attempts: 1,
        ..Default::default()
    };
    let manager = OtpManager::with_clock(
        store.clone(),
        notifier.clone(),
        config,
        Arc::new(ManualClock::new(t0())),
    );

    let code = manager.issue(EMAIL).await.unwrap().code;
    let wrong = if code == "000000" { "111111" } else { "000000" };

    // Every call reads the fresh record (attempts = 0) before any write
    let (w1, w2, w3, w4, right) = tokio::join!(
        manager.verify(EMAIL, wrong),
        manager.verify(EMAIL, wrong),
        manager.verify(EMAIL, wrong),
        manager.verify(EMAIL, wrong),
        manager.verify(EMAIL, &code),
    );

    let mut mismatches = 0;
    let mut exceeded = 0;
    for outcome in [w1, w2, w3, w4] {
        match outcome {
            Err(DomainError::Otp(OtpError::Mismatch { remaining_attempts: 0 })) => mismatches += 1,
            Err(DomainError::Otp(OtpError::AttemptsExceeded)) => exceeded += 1,
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    assert_eq!(mismatches, 1);
    assert_eq!(exceeded, 3);

    assert!(matches!(right, Err(DomainError::Otp(OtpError::AttemptsExceeded))));
    assert_eq!(store.get(EMAIL).await.unwrap().unwrap().attempts, 1);
}
