// Unit tests for readiness defaults and condition polling.
// HTTP attempt accounting is covered by tests/readiness_integration_test.rs
// against a live in-process server.

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn probe() -> ReadinessProbe {
    ReadinessProbe::new("backend", Url::parse("http://localhost:3004/api/v2/users/current").unwrap())
}

#[test]
fn test_default_ready_set_includes_auth_rejections() {
    let probe = probe();
    assert!(probe.is_ready_status(200));
    assert!(probe.is_ready_status(401));
    assert!(probe.is_ready_status(404));
    assert!(!probe.is_ready_status(503));
    assert!(!probe.is_ready_status(500));
}

#[test]
fn test_custom_ready_set_replaces_default() {
    let probe = probe().with_ready_statuses(vec![200]);
    assert!(probe.is_ready_status(200));
    assert!(!probe.is_ready_status(401));
}

#[test]
fn test_max_attempts_floor_is_one() {
    // A zero budget would never issue a request; clamp to one
    let probe = probe().with_max_attempts(0);
    // Indirectly observable through wait(), but the builder contract matters
    // enough to pin here via Debug formatting.
    assert!(format!("{:?}", probe).contains("max_attempts: 1"));
}

#[tokio::test]
async fn test_poll_until_returns_when_predicate_holds() {
    let calls = AtomicUsize::new(0);

    let result = poll_until(
        Duration::from_millis(5),
        Duration::from_secs(1),
        "counter to reach three",
        || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { n >= 3 }
        },
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_poll_until_times_out() {
    let result = poll_until(
        Duration::from_millis(5),
        Duration::from_millis(30),
        "a condition that never holds",
        || async { false },
    )
    .await;

    let err = result.unwrap_err();
    let harness: crate::errors::HarnessError = err.into();
    assert!(matches!(harness, crate::errors::HarnessError::Timeout(_)));
    assert!(harness.to_string().contains("a condition that never holds"));
}

#[tokio::test]
async fn test_poll_until_checks_immediately() {
    // An already-true predicate returns without sleeping
    let start = std::time::Instant::now();
    poll_until(
        Duration::from_millis(500),
        Duration::from_secs(5),
        "immediate",
        || async { true },
    )
    .await
    .unwrap();
    assert!(start.elapsed() < Duration::from_millis(100));
}
