use anyhow::Result;
use tracing::info;

use crate::commands::{smoke, utils::print_status};
use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::report::{RunReport, StepRecord, StepStatus};
use crate::runner::ServerManager;

/// Orchestrated run: spawn the servers, gate on readiness, run the selected
/// suites, write the report, tear everything down. Servers the operator
/// already started (via `--no-spawn`) are left alone.
pub async fn handle_run(
    config: &HarnessConfig,
    suite: bool,
    smoke_flow: bool,
    no_spawn: bool,
) -> Result<()> {
    let mut manager = ServerManager::new();
    let mut report = RunReport::new(config.environment.label());

    let result = run_inner(config, &mut manager, &mut report, suite, smoke_flow, no_spawn).await;

    // Teardown happens before the verdict so a failing run never leaks
    // server processes
    manager.stop_all();

    let path = report.save(&config.artifacts_dir)?;
    println!("📄 report written to {}", path.display());

    result?;
    if report.passed() {
        print_status(true, "run passed");
        Ok(())
    } else {
        for step in report.failed_steps() {
            print_status(false, &step.name);
        }
        Err(HarnessError::AssertionFailed("run had failing steps".into()).into())
    }
}

async fn run_inner(
    config: &HarnessConfig,
    manager: &mut ServerManager,
    report: &mut RunReport,
    suite: bool,
    smoke_flow: bool,
    no_spawn: bool,
) -> Result<()> {
    if !no_spawn {
        info!("Spawning backend and frontend servers");
        manager.start_backend(config).await?;
        manager.start_frontend(config).await?;
        print_status(true, "servers up");
    }

    if suite {
        let started = std::time::Instant::now();
        let outcome = manager.run_backend_suite(config)?;
        report.record(StepRecord {
            name: "backend suite".into(),
            status: if outcome.passed {
                StepStatus::Passed
            } else {
                StepStatus::Failed
            },
            reason: (!outcome.passed).then(|| "suite failures".to_string()),
            screenshot: None,
            duration_ms: started.elapsed().as_millis() as u64,
        });
        print_status(outcome.passed, "backend suite");
        if !outcome.passed {
            // Operators read the tail of the suite output, not the whole log
            for line in outcome.output.lines().rev().take(20).collect::<Vec<_>>().iter().rev() {
                println!("  {}", line);
            }
        }
    }

    if smoke_flow {
        smoke::execute(config, report).await?;
    }

    Ok(())
}
