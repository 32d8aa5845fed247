//! Run reporting: a uniform pass/fail shape per step, a JSON report on disk,
//! and the screenshot artifact naming scheme.
//!
//! The original scripts mixed thrown errors with ad hoc `{success, reason}`
//! objects; everything here funnels through [`StepStatus`] instead.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::HarnessError;

/// Outcome of one harness step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Expected state observed on the first check
    Passed,
    /// Expected state observed only after a refresh retry — the action
    /// landed, the first read was stale
    PassedAfterRefresh,
    /// Expected state never materialized
    Failed,
}

impl StepStatus {
    pub fn is_pass(&self) -> bool {
        !matches!(self, StepStatus::Failed)
    }

    /// Convert to a hard error for callers that treat failure as terminal
    pub fn into_result(self, what: &str) -> Result<StepStatus> {
        match self {
            StepStatus::Failed => {
                Err(HarnessError::AssertionFailed(what.to_string()).into())
            }
            status => Ok(status),
        }
    }
}

/// One step's record in the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    /// Reason code or message when the step failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Screenshot captured for this step, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
    pub duration_ms: u64,
}

/// The whole run, serialized to JSON under the artifacts directory
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub environment: String,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn new(environment: &str) -> Self {
        Self {
            started_at: Utc::now(),
            environment: environment.to_string(),
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    /// A run passes only if every step passed
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_pass())
    }

    pub fn failed_steps(&self) -> Vec<&StepRecord> {
        self.steps
            .iter()
            .filter(|s| !s.status.is_pass())
            .collect()
    }

    /// Write the report as pretty JSON, creating the directory if needed
    pub fn save(&self, artifacts_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(artifacts_dir).with_context(|| {
            format!("Failed to create artifacts dir {}", artifacts_dir.display())
        })?;
        let path = artifacts_dir.join("run-report.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report from {}", path.display()))?;
        serde_json::from_str(&json).context("Failed to parse run report")
    }
}

/// Path for a step's screenshot: `<step>-<timestamp>.png`, write-once,
/// only ever read by humans.
pub fn screenshot_path(artifacts_dir: &Path, step: &str) -> PathBuf {
    let slug: String = step
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S%.3f");
    artifacts_dir.join(format!("{}-{}.png", slug.to_lowercase(), timestamp))
}

#[cfg(test)]
#[path = "report_test.rs"]
mod report_test;
