// Readiness probe behavior against a real (in-process) HTTP server

mod common;

use std::time::Duration;

use chiprobe::{HarnessError, ReadinessProbe};
use serial_test::serial;
use url::Url;

fn health_url(base: &str) -> Url {
    Url::parse(&format!("{}/api/v2/users/current", base)).expect("valid test URL")
}

#[tokio::test]
#[serial]
async fn ready_on_first_attempt_when_server_is_up() {
    let (state, base) = common::spawn_backend(0).await;
    let client = reqwest::Client::new();

    let report = ReadinessProbe::new("backend", health_url(&base))
        .with_max_attempts(5)
        .with_delay(Duration::from_millis(10))
        .wait(&client)
        .await
        .expect("probe should succeed");

    // Unauthenticated 401 counts as ready
    assert_eq!(report.status, 401);
    assert_eq!(report.attempts, 1);
    assert_eq!(state.health_hit_count(), 1);
}

#[tokio::test]
#[serial]
async fn ready_after_exactly_the_failing_attempts() {
    // First three calls get 503, the fourth gets 401
    let (state, base) = common::spawn_backend(3).await;
    let client = reqwest::Client::new();

    let report = ReadinessProbe::new("backend", health_url(&base))
        .with_max_attempts(10)
        .with_delay(Duration::from_millis(10))
        .wait(&client)
        .await
        .expect("probe should succeed once the 503s run out");

    assert_eq!(report.attempts, 4);
    assert_eq!(report.status, 401);
    assert_eq!(state.health_hit_count(), 4);
}

#[tokio::test]
#[serial]
async fn gives_up_after_exactly_max_attempts() {
    // More failures queued than the attempt budget allows
    let (state, base) = common::spawn_backend(100).await;
    let client = reqwest::Client::new();

    let err = ReadinessProbe::new("backend", health_url(&base))
        .with_max_attempts(4)
        .with_delay(Duration::from_millis(10))
        .wait(&client)
        .await
        .expect_err("probe should give up");

    let harness_err: HarnessError = err.into();
    assert_eq!(harness_err.exit_code(), 4);
    assert!(harness_err.to_string().contains("backend"));
    assert_eq!(state.health_hit_count(), 4);
}

#[tokio::test]
#[serial]
async fn connection_refused_counts_as_an_attempt() {
    // Nothing is listening on this port pair
    let url = Url::parse("http://127.0.0.1:1/api/v2/users/current").expect("valid test URL");
    let client = reqwest::Client::new();

    let err = ReadinessProbe::new("backend", url)
        .with_max_attempts(2)
        .with_delay(Duration::from_millis(10))
        .wait(&client)
        .await
        .expect_err("nothing is listening");

    let harness_err: HarnessError = err.into();
    assert_eq!(harness_err.exit_code(), 4);
}

#[tokio::test]
#[serial]
async fn custom_ready_set_rejects_default_statuses() {
    // A probe that only accepts 200 should not be satisfied by the 401
    let (_state, base) = common::spawn_backend(0).await;
    let client = reqwest::Client::new();

    let err = ReadinessProbe::new("backend", health_url(&base))
        .with_ready_statuses(vec![200])
        .with_max_attempts(2)
        .with_delay(Duration::from_millis(10))
        .wait(&client)
        .await
        .expect_err("401 is outside the custom ready set");

    let harness_err: HarnessError = err.into();
    assert_eq!(harness_err.exit_code(), 4);
}
