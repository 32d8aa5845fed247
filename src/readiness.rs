//! Readiness polling for the servers the harness depends on.
//!
//! A flat retry loop: request, check the status against the ready set, sleep,
//! repeat up to the attempt cap. No backoff, no jitter. 401 and 404 are in the
//! default ready set because an authenticated-only endpoint rejecting us still
//! proves the process is up and serving.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};
use url::Url;

use crate::errors::HarnessError;

/// Statuses that prove the service is accepting requests
pub const DEFAULT_READY_STATUSES: &[u16] = &[200, 301, 302, 401, 404];

/// Default attempt budget (30 attempts x 2s = up to a minute of waiting)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default fixed delay between attempts
pub const DEFAULT_ATTEMPT_DELAY: Duration = Duration::from_secs(2);

/// Repeated health checks against one service until it responds acceptably
/// or the attempt budget runs out.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    service: String,
    url: Url,
    ready_statuses: Vec<u16>,
    max_attempts: u32,
    delay: Duration,
}

/// How a successful wait went
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyReport {
    /// Number of HTTP calls made, including the one that succeeded
    pub attempts: u32,
    /// The status that satisfied the ready set
    pub status: u16,
}

impl ReadinessProbe {
    pub fn new(service: impl Into<String>, url: Url) -> Self {
        Self {
            service: service.into(),
            url,
            ready_statuses: DEFAULT_READY_STATUSES.to_vec(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_ATTEMPT_DELAY,
        }
    }

    pub fn with_ready_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.ready_statuses = statuses;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn is_ready_status(&self, status: u16) -> bool {
        self.ready_statuses.contains(&status)
    }

    /// Poll until the service responds with a ready status. Connection errors
    /// and non-ready statuses both count as "not ready yet". Succeeds on the
    /// first acceptable response; fails after exactly `max_attempts` calls.
    pub async fn wait(&self, client: &reqwest::Client) -> Result<ReadyReport> {
        info!(
            "Waiting for {} at {} (up to {} attempts)",
            self.service, self.url, self.max_attempts
        );

        for attempt in 1..=self.max_attempts {
            match client.get(self.url.clone()).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if self.is_ready_status(status) {
                        info!(
                            "{} ready after {} attempt(s) (HTTP {})",
                            self.service, attempt, status
                        );
                        return Ok(ReadyReport { attempts: attempt, status });
                    }
                    debug!(
                        "{} attempt {}/{}: HTTP {} not in ready set",
                        self.service, attempt, self.max_attempts, status
                    );
                }
                Err(e) => {
                    debug!(
                        "{} attempt {}/{}: {}",
                        self.service, attempt, self.max_attempts, e
                    );
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.delay).await;
            }
        }

        Err(HarnessError::ServiceUnavailable {
            service: self.service.clone(),
            attempts: self.max_attempts,
        }
        .into())
    }
}

/// Re-evaluate `predicate` every `interval` until it holds or `timeout`
/// elapses. The condition-polling replacement for the fixed sleeps the
/// original scripts used everywhere.
pub async fn poll_until<F, Fut>(
    interval: Duration,
    timeout: Duration,
    what: &str,
    mut predicate: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    loop {
        if predicate().await {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(HarnessError::Timeout(format!(
                "{} (after {:?})",
                what, timeout
            ))
            .into());
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
#[path = "readiness_test.rs"]
mod readiness_test;
