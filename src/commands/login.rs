use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::api::ApiClient;
use crate::browser::{Browser, BrowserKind};
use crate::commands::utils::print_status;
use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::locator;
use crate::roundtrip::RoundTrip;
use crate::session::Credentials;

pub async fn handle_login(
    config: &HarnessConfig,
    email: Option<String>,
    password: Option<String>,
    via_ui: bool,
    browser_kind: String,
    no_headless: bool,
) -> Result<()> {
    let credentials = match (email, password) {
        (Some(e), Some(p)) => Credentials::new(e, p),
        _ => {
            let (e, p) = config.admin_credentials()?;
            Credentials::new(e, p)
        }
    };

    if via_ui {
        login_via_ui(config, &credentials, browser_kind.parse()?, !no_headless).await
    } else {
        login_via_api(config, &credentials).await
    }
}

async fn login_via_api(config: &HarnessConfig, credentials: &Credentials) -> Result<()> {
    let mut api = ApiClient::new(config.backend_url.clone())?;
    let token = api.login(credentials).await?;
    print_status(true, &format!("signed in, token {}", token.preview()));

    // The token is only proven good once an authenticated endpoint accepts it
    let user = api.current_user().await?;
    let label = user
        .get("email")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("<unknown>");
    print_status(true, &format!("token accepted for {}", label));
    Ok(())
}

async fn login_via_ui(
    config: &HarnessConfig,
    credentials: &Credentials,
    kind: BrowserKind,
    headless: bool,
) -> Result<()> {
    let browser = Browser::connect(kind, headless).await?;
    let login_url = config.frontend_page("/login")?;

    browser.goto(login_url.as_str()).await?;
    browser
        .fill_any(&locator::email_field(), &credentials.email)
        .await?;
    browser
        .fill_any(&locator::password_field(), &credentials.password)
        .await?;

    // Submitting sets the jwtToken cookie asynchronously after the redirect;
    // a stale first read gets one reload before we call it a failure
    let browser_ref = &browser;
    let status = RoundTrip::new("jwtToken cookie set after UI login")
        .with_settle(Duration::from_secs(2))
        .run_with_refresh(
            move || async move {
                browser_ref.click_any(&locator::submit_button()).await?;
                Ok(())
            },
            move || async move { Ok(browser_ref.cookie("jwtToken").await?.is_some()) },
            move || async move { browser_ref.reload().await },
        )
        .await?;

    if !status.is_pass() {
        let shot = browser
            .screenshot("ui-login-failed", &config.artifacts_dir)
            .await?;
        print_status(false, &format!("no jwtToken cookie; see {}", shot.display()));
        browser.close().await?;
        return Err(HarnessError::AssertionFailed(
            "UI login did not set the jwtToken cookie".into(),
        )
        .into());
    }

    info!("UI login round trip: {:?}", status);
    print_status(true, "UI login set the jwtToken cookie");
    browser.close().await?;
    Ok(())
}
