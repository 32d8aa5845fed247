use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::api::ApiClient;
use crate::commands::utils::{print_status, StepTimer};
use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::readiness::ReadinessProbe;
use crate::report::{RunReport, StepStatus};
use crate::roundtrip::RoundTrip;
use crate::session::{unique_name, Credentials};

/// API smoke test: readiness, sign-in, token check, and a campaign
/// create-then-list round trip. Records every step in the report.
pub async fn execute(config: &HarnessConfig, report: &mut RunReport) -> Result<()> {
    let client = reqwest::Client::new();

    // Backend up?
    let step = StepTimer::start("backend ready");
    let probe = ReadinessProbe::new("backend", config.backend_api("/api/v2/users/current")?);
    match probe.wait(&client).await {
        Ok(ready) => {
            step.pass(report, StepStatus::Passed);
            print_status(true, &format!("backend ready (HTTP {})", ready.status));
        }
        Err(e) => {
            let harness: HarnessError = e.into();
            step.fail(report, harness.reason_code().to_string(), None);
            print_status(false, &harness.to_string());
            return Err(harness.into());
        }
    }

    // Sign in
    let (email, password) = config.admin_credentials()?;
    let credentials = Credentials::new(email, password);
    let mut api = ApiClient::new(config.backend_url.clone())?;

    let step = StepTimer::start("sign in");
    match api.login(&credentials).await {
        Ok(token) => {
            step.pass(report, StepStatus::Passed);
            print_status(true, &format!("signed in, token {}", token.preview()));
        }
        Err(e) => {
            let harness: HarnessError = e.into();
            step.fail(report, harness.reason_code().to_string(), None);
            print_status(false, &harness.to_string());
            return Err(harness.into());
        }
    }

    // Token accepted?
    let step = StepTimer::start("current user");
    match api.current_user().await {
        Ok(_) => {
            step.pass(report, StepStatus::Passed);
            print_status(true, "token accepted by /api/v2/users/current");
        }
        Err(e) => {
            let harness: HarnessError = e.into();
            step.fail(report, harness.reason_code().to_string(), None);
            print_status(false, &harness.to_string());
            return Err(harness.into());
        }
    }

    // Create a campaign, then expect it in the list; the refresh arm
    // re-fetches with a cache-busting query param
    let name = unique_name("Smoke Campaign");
    info!("Creating campaign '{}'", name);

    let step = StepTimer::start("campaign appears in list");
    let api_ref = &api;
    let name_ref = &name;
    let status = RoundTrip::new("campaign appears in list")
        .with_settle(Duration::from_secs(1))
        .run_with_refresh(
            move || async move {
                api_ref.create_campaign(name_ref).await?;
                Ok(())
            },
            move || async move { api_ref.campaign_listed(name_ref, false).await },
            move || async move {
                // Cache-busted re-fetch stands in for a page reload
                api_ref.list_campaigns(true).await?;
                Ok(())
            },
        )
        .await?;

    print_status(
        status.is_pass(),
        &format!("campaign '{}' listed: {:?}", name, status),
    );
    match status {
        StepStatus::Failed => {
            step.fail(report, "assertion_failed".into(), None);
            return status.into_result("campaign appears in list").map(|_| ());
        }
        status => step.pass(report, status),
    }

    Ok(())
}

pub async fn handle_smoke(config: &HarnessConfig) -> Result<()> {
    let mut report = RunReport::new(config.environment.label());
    let result = execute(config, &mut report).await;

    let path = report.save(&config.artifacts_dir)?;
    println!("📄 report written to {}", path.display());

    result?;
    if !report.passed() {
        return Err(HarnessError::AssertionFailed("smoke run had failing steps".into()).into());
    }
    Ok(())
}
