//! # chiprobe
//!
//! End-to-end smoke-test and debug harness for the Chi War web application.
//!
//! Drives the frontend through WebDriver and the backend through its JSON
//! API. Three reusable patterns underpin every command:
//!
//! - **readiness polling**: flat retry loops against service health
//!   endpoints, where even a 401 proves the process is up
//! - **selector fallback chains**: a semantic intent ("the create button")
//!   mapped to an ordered list of typed locator strategies, the first visible
//!   match winning
//! - **action-then-assert round trips**: trigger an asynchronous effect,
//!   settle, check — with one refresh retry to tell cache staleness from
//!   real failure
//!
//! ## CLI usage
//!
//! ```bash
//! # Wait for the test servers to come up
//! chiprobe ready
//!
//! # API login smoke test (credentials from CHIWAR_ADMIN_EMAIL/PASSWORD)
//! chiprobe login
//!
//! # Login through the real UI and assert the jwtToken cookie landed
//! chiprobe login --via-ui
//!
//! # Readiness + login + campaign round trip, with a JSON report
//! chiprobe smoke
//!
//! # Browser flows (signup confirmation, campaign creation, fight creation)
//! chiprobe flow signup
//! chiprobe flow campaign
//!
//! # Debug a page: title, console logs, screenshot
//! chiprobe inspect http://localhost:3005/campaigns
//!
//! # Start servers, gate on readiness, run everything, tear down
//! chiprobe run --suite --smoke
//! ```
//!
//! Base URLs default to the test port pair (backend 3004, frontend 3005);
//! set `CHIPROBE_ENV=dev` for the dev pair (3000/3001) or override with
//! `CHIWAR_BACKEND_URL` / `CHIWAR_FRONTEND_URL`.

/// Backend JSON API client
pub mod api;

/// WebDriver browser control
pub mod browser;

/// Per-run configuration from the environment
pub mod config;

/// Error type with process exit codes
pub mod errors;

/// Locator strategies and fallback chains
pub mod locator;

/// Readiness probes and condition polling
pub mod readiness;

/// Run reports and screenshot artifacts
pub mod report;

/// Action-then-assert round trips
pub mod roundtrip;

/// Server process management
pub mod runner;

/// Per-run credentials, names, and tokens
pub mod session;

pub use api::ApiClient;
pub use browser::{Browser, BrowserKind, ConsoleMessage};
pub use config::{Environment, HarnessConfig};
pub use errors::HarnessError;
pub use locator::{FallbackChain, LocatorStrategy};
pub use readiness::{poll_until, ReadinessProbe, ReadyReport};
pub use report::{RunReport, StepRecord, StepStatus};
pub use roundtrip::RoundTrip;
pub use session::{AuthToken, Credentials};
