//! Action-then-assert round trips.
//!
//! Perform an action expected to produce an asynchronous side effect, give the
//! system a settle delay, then check for the effect. If the first check comes
//! up empty and the caller supplied a refresh arm, refresh once (full reload,
//! cache-busting re-fetch) and check again — the second check decides, which
//! distinguishes client-side cache staleness from true failure. Exactly one
//! retry, no retry budget beyond that.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::report::StepStatus;

/// Default settle delay before the first check
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct RoundTrip {
    what: String,
    settle: Duration,
}

impl RoundTrip {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            settle: DEFAULT_SETTLE,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Action, settle, single check. No refresh arm: a failed first check is
    /// the final answer.
    pub async fn run<A, FA, C, FC>(&self, action: A, mut check: C) -> Result<StepStatus>
    where
        A: FnOnce() -> FA,
        FA: Future<Output = Result<()>>,
        C: FnMut() -> FC,
        FC: Future<Output = Result<bool>>,
    {
        action().await?;
        debug!("'{}': settling for {:?}", self.what, self.settle);
        tokio::time::sleep(self.settle).await;

        if check().await? {
            info!("'{}' passed on first check", self.what);
            Ok(StepStatus::Passed)
        } else {
            warn!("'{}' failed: expected state did not materialize", self.what);
            Ok(StepStatus::Failed)
        }
    }

    /// Action, settle, check; on a failed first check run `refresh`, settle
    /// again, and let the second check decide.
    pub async fn run_with_refresh<A, FA, C, FC, R, FR>(
        &self,
        action: A,
        mut check: C,
        refresh: R,
    ) -> Result<StepStatus>
    where
        A: FnOnce() -> FA,
        FA: Future<Output = Result<()>>,
        C: FnMut() -> FC,
        FC: Future<Output = Result<bool>>,
        R: FnOnce() -> FR,
        FR: Future<Output = Result<()>>,
    {
        action().await?;
        debug!("'{}': settling for {:?}", self.what, self.settle);
        tokio::time::sleep(self.settle).await;

        if check().await? {
            info!("'{}' passed on first check", self.what);
            return Ok(StepStatus::Passed);
        }

        info!("'{}' not observed yet, refreshing and checking once more", self.what);
        refresh().await?;
        tokio::time::sleep(self.settle).await;

        if check().await? {
            info!("'{}' passed after refresh", self.what);
            Ok(StepStatus::PassedAfterRefresh)
        } else {
            warn!("'{}' failed after refresh retry", self.what);
            Ok(StepStatus::Failed)
        }
    }
}

#[cfg(test)]
#[path = "roundtrip_test.rs"]
mod roundtrip_test;
