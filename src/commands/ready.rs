use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::commands::utils::print_status;
use crate::config::HarnessConfig;
use crate::readiness::ReadinessProbe;

pub async fn handle_ready(
    config: &HarnessConfig,
    max_attempts: u32,
    delay_secs: u64,
    backend_only: bool,
) -> Result<()> {
    info!(
        "Checking readiness for the {} environment",
        config.environment.label()
    );

    let client = reqwest::Client::new();

    let backend = ReadinessProbe::new("backend", config.backend_api("/api/v2/users/current")?)
        .with_max_attempts(max_attempts)
        .with_delay(Duration::from_secs(delay_secs));
    let report = backend.wait(&client).await?;
    print_status(
        true,
        &format!(
            "backend ready after {} attempt(s) (HTTP {})",
            report.attempts, report.status
        ),
    );

    if !backend_only {
        let frontend = ReadinessProbe::new("frontend", config.frontend_page("/")?)
            .with_max_attempts(max_attempts)
            .with_delay(Duration::from_secs(delay_secs));
        let report = frontend.wait(&client).await?;
        print_status(
            true,
            &format!(
                "frontend ready after {} attempt(s) (HTTP {})",
                report.attempts, report.status
            ),
        );
    }

    Ok(())
}
