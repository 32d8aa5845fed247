// Unit tests for run report serialization and artifact naming

use super::*;
use pretty_assertions::assert_eq;

fn sample_report() -> RunReport {
    let mut report = RunReport::new("test");
    report.record(StepRecord {
        name: "backend ready".into(),
        status: StepStatus::Passed,
        reason: None,
        screenshot: None,
        duration_ms: 4100,
    });
    report.record(StepRecord {
        name: "campaign appears in list".into(),
        status: StepStatus::PassedAfterRefresh,
        reason: None,
        screenshot: None,
        duration_ms: 5230,
    });
    report
}

#[test]
fn test_report_passes_when_all_steps_pass() {
    let report = sample_report();
    assert!(report.passed());
    assert!(report.failed_steps().is_empty());
}

#[test]
fn test_report_fails_on_any_failed_step() {
    let mut report = sample_report();
    report.record(StepRecord {
        name: "jwt cookie present".into(),
        status: StepStatus::Failed,
        reason: Some("assertion_failed".into()),
        screenshot: Some(PathBuf::from("test-results/jwt-cookie-present-x.png")),
        duration_ms: 900,
    });

    assert!(!report.passed());
    let failed = report.failed_steps();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].name, "jwt cookie present");
}

#[test]
fn test_report_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let report = sample_report();

    let path = report.save(dir.path()).unwrap();
    assert!(path.ends_with("run-report.json"));

    let loaded = RunReport::load(&path).unwrap();
    assert_eq!(loaded.environment, "test");
    assert_eq!(loaded.steps.len(), 2);
    assert_eq!(loaded.steps[1].status, StepStatus::PassedAfterRefresh);
}

#[test]
fn test_status_serializes_snake_case() {
    let json = serde_json::to_string(&StepStatus::PassedAfterRefresh).unwrap();
    assert_eq!(json, "\"passed_after_refresh\"");
}

#[test]
fn test_screenshot_path_slugs_step_name() {
    let path = screenshot_path(Path::new("test-results"), "Login via UI");
    let name = path.file_name().unwrap().to_string_lossy().to_string();

    assert!(name.starts_with("login-via-ui-"));
    assert!(name.ends_with(".png"));
    assert!(!name.contains(' '));
}
