use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::browser::{Browser, BrowserKind};
use crate::config::HarnessConfig;

/// Debug utility: navigate, report page state, dump console logs, and always
/// leave a screenshot behind. The closest thing to the old one-shot debug
/// scripts, minus the copy-paste.
pub async fn handle_inspect(
    config: &HarnessConfig,
    url: String,
    wait_text: Option<String>,
    browser_kind: String,
    no_headless: bool,
) -> Result<()> {
    let kind: BrowserKind = browser_kind.parse()?;
    let browser = Browser::connect(kind, !no_headless).await?;

    info!("Inspecting {}", url);
    browser.goto(&url).await?;

    if let Some(text) = &wait_text {
        match browser.wait_for_text(text, Duration::from_secs(10)).await {
            Ok(()) => println!("✅ found text: {}", text),
            Err(e) => println!("⚠️  {}", e),
        }
    }

    println!("URL:   {}", browser.current_url().await?);
    println!("Title: {}", browser.title().await?);

    let logs = browser.console_logs().await?;
    if logs.is_empty() {
        println!("Console: (no messages captured)");
    } else {
        println!("Console ({} messages):", logs.len());
        for log in &logs {
            println!("  [{}] {} {}", log.level, log.timestamp, log.message);
        }
    }

    let shot = browser.screenshot("inspect", &config.artifacts_dir).await?;
    println!("📸 {}", shot.display());

    browser.close().await?;
    Ok(())
}
