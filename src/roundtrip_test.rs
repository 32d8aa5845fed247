// Unit tests for action-then-assert semantics

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn trip() -> RoundTrip {
    RoundTrip::new("campaign appears in list").with_settle(Duration::from_millis(5))
}

#[tokio::test]
async fn test_passes_on_first_check() {
    let checks = AtomicUsize::new(0);

    let status = trip()
        .run(
            || async { Ok(()) },
            || {
                checks.fetch_add(1, Ordering::SeqCst);
                async { Ok(true) }
            },
        )
        .await
        .unwrap();

    assert_eq!(status, StepStatus::Passed);
    assert_eq!(checks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fails_without_refresh_arm() {
    let status = trip()
        .run(|| async { Ok(()) }, || async { Ok(false) })
        .await
        .unwrap();

    assert_eq!(status, StepStatus::Failed);
    assert!(!status.is_pass());
}

#[tokio::test]
async fn test_second_check_decides_after_refresh() {
    // Effect only observable after the reload: first check misses, refresh
    // flips the state, second check decides
    let checks = AtomicUsize::new(0);
    let refreshed = AtomicUsize::new(0);

    let status = trip()
        .run_with_refresh(
            || async { Ok(()) },
            || {
                let n = checks.fetch_add(1, Ordering::SeqCst);
                let seen_refresh = refreshed.load(Ordering::SeqCst) > 0;
                async move { Ok(n > 0 && seen_refresh) }
            },
            || {
                refreshed.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
        )
        .await
        .unwrap();

    assert_eq!(status, StepStatus::PassedAfterRefresh);
    assert_eq!(checks.load(Ordering::SeqCst), 2);
    assert_eq!(refreshed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_exactly_one_refresh_retry() {
    let checks = AtomicUsize::new(0);
    let refreshes = AtomicUsize::new(0);

    let status = trip()
        .run_with_refresh(
            || async { Ok(()) },
            || {
                checks.fetch_add(1, Ordering::SeqCst);
                async { Ok(false) }
            },
            || {
                refreshes.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
        )
        .await
        .unwrap();

    assert_eq!(status, StepStatus::Failed);
    assert_eq!(checks.load(Ordering::SeqCst), 2);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refresh_skipped_when_first_check_passes() {
    let refreshes = AtomicUsize::new(0);

    let status = trip()
        .run_with_refresh(
            || async { Ok(()) },
            || async { Ok(true) },
            || {
                refreshes.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
        )
        .await
        .unwrap();

    assert_eq!(status, StepStatus::Passed);
    assert_eq!(refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_action_error_propagates() {
    let result = trip()
        .run(
            || async { Err(anyhow::anyhow!("click failed")) },
            || async { Ok(true) },
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_failed_converts_to_assertion_error() {
    let err = StepStatus::Failed
        .into_result("campaign appears in list")
        .unwrap_err();
    let harness: crate::errors::HarnessError = err.into();
    assert!(matches!(
        harness,
        crate::errors::HarnessError::AssertionFailed(_)
    ));
    assert_eq!(harness.exit_code(), 6);
}
