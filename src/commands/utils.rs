use std::path::PathBuf;
use std::time::Instant;

use crate::report::{RunReport, StepRecord, StepStatus};

/// Times one step and writes its record into the run report
pub struct StepTimer {
    name: String,
    start: Instant,
}

impl StepTimer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    pub fn pass(self, report: &mut RunReport, status: StepStatus) {
        self.record(report, status, None, None);
    }

    pub fn fail(self, report: &mut RunReport, reason: String, screenshot: Option<PathBuf>) {
        self.record(report, StepStatus::Failed, Some(reason), screenshot);
    }

    fn record(
        self,
        report: &mut RunReport,
        status: StepStatus,
        reason: Option<String>,
        screenshot: Option<PathBuf>,
    ) {
        report.record(StepRecord {
            name: self.name,
            status,
            reason,
            screenshot,
            duration_ms: self.start.elapsed().as_millis() as u64,
        });
    }
}

/// Emoji status line for a step, matching the original scripts' output style
pub fn print_status(ok: bool, message: &str) {
    if ok {
        println!("✅ {}", message);
    } else {
        println!("❌ {}", message);
    }
}
