use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::api::ApiClient;
use crate::browser::{Browser, BrowserKind};
use crate::commands::utils::print_status;
use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::locator::{self, FallbackChain, LocatorStrategy};
use crate::report::{RunReport, StepRecord, StepStatus};
use crate::roundtrip::RoundTrip;
use crate::session::{unique_name, Credentials};

/// Browser flows the harness can drive end to end
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum FlowName {
    /// Register a new account and expect the confirmation prompt
    Signup,
    /// Create a campaign through the UI, verify it through the API
    Campaign,
    /// Create a fight through the UI, verify it through the API
    Fight,
}

pub async fn handle_flow(
    config: &HarnessConfig,
    flow: FlowName,
    browser_kind: String,
    no_headless: bool,
) -> Result<()> {
    let kind: BrowserKind = browser_kind.parse()?;
    let browser = Browser::connect(kind, !no_headless).await?;

    let mut report = RunReport::new(config.environment.label());
    let started = std::time::Instant::now();

    let result = match flow {
        FlowName::Signup => signup_flow(config, &browser).await,
        FlowName::Campaign => entity_flow(config, &browser, "campaign", "/campaigns").await,
        FlowName::Fight => entity_flow(config, &browser, "fight", "/fights").await,
    };

    let (status, reason, screenshot) = match &result {
        Ok(status) => (status.clone(), None, None),
        Err(e) => {
            // Failure evidence for humans; the error itself still propagates
            let shot = browser
                .screenshot(&format!("flow-{:?}-failed", flow), &config.artifacts_dir)
                .await
                .ok();
            (StepStatus::Failed, Some(e.to_string()), shot)
        }
    };

    report.record(StepRecord {
        name: format!("flow {:?}", flow),
        status: status.clone(),
        reason,
        screenshot,
        duration_ms: started.elapsed().as_millis() as u64,
    });
    let path = report.save(&config.artifacts_dir)?;
    println!("📄 report written to {}", path.display());

    browser.close().await?;

    let status = result?;
    print_status(status.is_pass(), &format!("flow {:?}: {:?}", flow, status));
    status.into_result(&format!("flow {:?}", flow)).map(|_| ())
}

/// Fill the registration form and expect the "check your email" prompt.
/// Actual confirmation needs the emailed token, which `chiprobe` cannot
/// read; `ApiClient::confirm` covers that half when a token is in hand.
async fn signup_flow(config: &HarnessConfig, browser: &Browser) -> Result<StepStatus> {
    let credentials = Credentials::unique("signup");
    info!("Registering {}", credentials.email);

    browser
        .goto(config.frontend_page("/register")?.as_str())
        .await?;
    browser
        .fill_any(&locator::email_field(), &credentials.email)
        .await?;
    browser
        .fill_any(&locator::password_field(), &credentials.password)
        .await?;

    let status = RoundTrip::new("confirmation prompt after signup")
        .with_settle(Duration::from_secs(2))
        .run_with_refresh(
            move || async move {
                browser.click_any(&locator::submit_button()).await?;
                Ok(())
            },
            move || async move {
                Ok(browser
                    .wait_for_text("confirmation", Duration::from_secs(3))
                    .await
                    .is_ok())
            },
            move || async move { browser.reload().await },
        )
        .await?;

    Ok(status)
}

/// Create a named entity through the UI and verify it through the API list
/// endpoint — the cross-channel arm rules out a UI that lies about success.
async fn entity_flow(
    config: &HarnessConfig,
    browser: &Browser,
    noun: &str,
    list_path: &str,
) -> Result<StepStatus> {
    // API session for the verification arm
    let (email, password) = config.admin_credentials()?;
    let mut api = ApiClient::new(config.backend_url.clone())?;
    let token = api.login(&Credentials::new(email.clone(), password.clone())).await?;
    info!("API session ready ({})", token.preview());

    // UI session for the action arm
    ui_login(config, browser, &email, &password).await?;

    let name = unique_name(noun);
    let list_url = config.frontend_page(list_path)?;
    browser.goto(list_url.as_str()).await?;

    // Prefer the create button; fall back to the direct new-entity URL when
    // the control is missing from this page variant
    if !browser.try_click_any(&locator::create_button(noun)).await? {
        let new_url = config.frontend_page(&format!("{}/new", list_path))?;
        info!("No create control found, navigating to {}", new_url);
        browser.goto(new_url.as_str()).await?;
    }

    browser.fill_any(&locator::name_field(), &name).await?;

    let collection = list_path.trim_start_matches('/');
    let api_ref = &api;
    let name_ref = name.as_str();
    let browser_ref = browser;
    let status = RoundTrip::new("created entity is listed")
        .with_settle(Duration::from_secs(2))
        .run_with_refresh(
            move || async move {
                browser_ref.click_any(&locator::submit_button()).await?;
                Ok(())
            },
            move || async move { api_ref.entity_listed(collection, name_ref, false).await },
            move || async move {
                browser_ref.reload().await?;
                // Bust the API-side cache too
                api_ref.list_collection(collection, true).await.map(|_| ())
            },
        )
        .await?;

    Ok(status)
}

/// Drive the login form, with a direct-URL fallback if no login link is
/// visible from the landing page
async fn ui_login(
    config: &HarnessConfig,
    browser: &Browser,
    email: &str,
    password: &str,
) -> Result<()> {
    browser.goto(config.frontend_url.as_str()).await?;

    let login_link = FallbackChain::new(
        "the login link",
        vec![
            LocatorStrategy::TestId("login-link".into()),
            LocatorStrategy::Text("Login".into()),
            LocatorStrategy::Css("a[href='/login']".into()),
        ],
    );
    if !browser.try_click_any(&login_link).await? {
        browser.goto(config.frontend_page("/login")?.as_str()).await?;
    }

    browser.fill_any(&locator::email_field(), email).await?;
    browser
        .fill_any(&locator::password_field(), password)
        .await?;
    browser.click_any(&locator::submit_button()).await?;

    // Logged-in state is proven by the cookie, not by the click
    crate::readiness::poll_until(
        Duration::from_millis(250),
        Duration::from_secs(10),
        "jwtToken cookie after UI login",
        move || async move { matches!(browser.cookie("jwtToken").await, Ok(Some(_))) },
    )
    .await
    .map_err(|_| {
        HarnessError::AssertionFailed("UI login did not set the jwtToken cookie".into()).into()
    })
}
