use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder, Locator};
use fantoccini::elements::Element;
use serde_json::json;
use tracing::{debug, info};

use crate::errors::HarnessError;
use crate::locator::{FallbackChain, LocatorStrategy};
use crate::readiness::poll_until;
use crate::report::screenshot_path;

/// How long goto waits for document.readyState to reach "complete"
const PAGE_READY_TIMEOUT: Duration = Duration::from_secs(10);
const PAGE_READY_INTERVAL: Duration = Duration::from_millis(100);

/// Supported browser kinds
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BrowserKind {
    /// Mozilla Firefox via geckodriver
    Firefox,
    /// Google Chrome/Chromium via chromedriver
    Chrome,
}

impl std::str::FromStr for BrowserKind {
    type Err = anyhow::Error;

    /// Parse browser kind from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserKind::Firefox),
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}", s),
        }
    }
}

impl BrowserKind {
    /// Standard WebDriver endpoint for this browser kind
    pub fn webdriver_url(&self) -> &'static str {
        match self {
            BrowserKind::Firefox => "http://localhost:4444",
            BrowserKind::Chrome => "http://localhost:9515",
        }
    }

    fn driver_name(&self) -> &'static str {
        match self {
            BrowserKind::Firefox => "geckodriver",
            BrowserKind::Chrome => "chromedriver",
        }
    }
}

/// Console message captured from the page
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConsoleMessage {
    /// Log level (log, warn, error, info)
    pub level: String,
    /// The console message text
    pub message: String,
    /// Timestamp when the message was logged
    pub timestamp: String,
}

/// One driven browser context. Flows that need a second simulated user
/// construct a second instance; both are still driven sequentially.
pub struct Browser {
    client: Client,
    kind: BrowserKind,
}

impl Browser {
    /// Connect to a WebDriver, verifying its /status endpoint first so a
    /// missing driver fails with instructions instead of a connect error.
    pub async fn connect(kind: BrowserKind, headless: bool) -> Result<Self> {
        let webdriver_url = kind.webdriver_url();
        info!("Connecting to {:?} WebDriver at {}", kind, webdriver_url);

        if !Self::webdriver_responding(webdriver_url).await {
            anyhow::bail!(
                "Cannot reach {} at {}.\n\
                Start it first:\n\
                  Firefox: geckodriver --port 4444\n\
                  Chrome: chromedriver --port 9515",
                kind.driver_name(),
                webdriver_url
            );
        }

        let mut caps = serde_json::Map::new();
        match kind {
            BrowserKind::Firefox => {
                let mut args = Vec::new();
                if headless {
                    args.push("--headless".to_string());
                }
                caps.insert(
                    "moz:firefoxOptions".to_string(),
                    json!({ "args": args }),
                );
            }
            BrowserKind::Chrome => {
                let mut args = vec!["--no-sandbox".to_string()];
                if headless {
                    args.push("--headless=new".to_string());
                    args.push("--disable-gpu".to_string());
                    args.push("--disable-dev-shm-usage".to_string());
                }
                caps.insert(
                    "goog:chromeOptions".to_string(),
                    json!({ "args": args }),
                );
            }
        }

        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .context("Failed to connect to WebDriver")?;

        let browser = Browser { client, kind };
        browser.install_console_capture().await?;
        Ok(browser)
    }

    async fn webdriver_responding(url: &str) -> bool {
        let status_url = format!("{}/status", url);
        match reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub fn kind(&self) -> BrowserKind {
        self.kind
    }

    /// Navigate and condition-poll for document readiness instead of
    /// sleeping a fixed interval.
    pub async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.client.goto(url).await?;

        self.wait_page_ready("document.readyState to reach 'complete'")
            .await?;

        // The capture shim does not survive navigation
        self.install_console_capture().await?;
        Ok(())
    }

    /// Full page reload, for the refresh arm of round trips
    pub async fn reload(&self) -> Result<()> {
        self.client.refresh().await?;
        self.wait_page_ready("document.readyState after reload")
            .await?;
        self.install_console_capture().await?;
        Ok(())
    }

    async fn wait_page_ready(&self, what: &str) -> Result<()> {
        let client = &self.client;
        poll_until(PAGE_READY_INTERVAL, PAGE_READY_TIMEOUT, what, move || async move {
            matches!(
                client
                    .execute("return document.readyState === 'complete';", vec![])
                    .await,
                Ok(v) if v.as_bool().unwrap_or(false)
            )
        })
        .await
    }

    pub async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    pub async fn title(&self) -> Result<String> {
        Ok(self.client.title().await?)
    }

    /// Query one strategy for a currently visible element
    async fn probe_visible(&self, strategy: LocatorStrategy) -> Option<Element> {
        let css = strategy.as_css();
        let xpath = strategy.as_xpath();
        let locator = match (&css, &xpath) {
            (Some(c), _) => Locator::Css(c),
            (None, Some(x)) => Locator::XPath(x),
            _ => return None,
        };

        let element = self.client.find(locator).await.ok()?;
        match element.is_displayed().await {
            Ok(true) => Some(element),
            _ => None,
        }
    }

    /// Resolve a fallback chain to a visible element or fail hard
    async fn resolve(&self, chain: &FallbackChain) -> Result<Element> {
        match chain.resolve_with(|s| self.probe_visible(s)).await {
            Ok(resolved) => {
                debug!("'{}' matched via {}", chain.intent(), resolved.strategy);
                Ok(resolved.value)
            }
            Err(e) => {
                debug!("{}", e);
                Err(HarnessError::ElementNotFound(format!(
                    "{} (tried: {})",
                    chain.intent(),
                    chain
                        .candidates()
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
                .into())
            }
        }
    }

    /// Click the first visible element any candidate matches
    pub async fn click_any(&self, chain: &FallbackChain) -> Result<()> {
        let element = self.resolve(chain).await?;
        element.click().await?;
        Ok(())
    }

    /// Click if any candidate matches; returns false when none did, leaving
    /// the fallback (usually direct URL navigation) to the caller.
    pub async fn try_click_any(&self, chain: &FallbackChain) -> Result<bool> {
        match chain.try_resolve_with(|s| self.probe_visible(s)).await {
            Some(resolved) => {
                resolved.value.click().await?;
                Ok(true)
            }
            None => {
                debug!("No candidate matched for '{}', caller falls back", chain.intent());
                Ok(false)
            }
        }
    }

    /// Clear and fill the first visible element any candidate matches
    pub async fn fill_any(&self, chain: &FallbackChain, text: &str) -> Result<()> {
        let element = self.resolve(chain).await?;
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    /// Condition-poll the page body for a substring
    pub async fn wait_for_text(&self, text: &str, timeout: Duration) -> Result<()> {
        let script = "return document.body ? document.body.innerText : '';";
        let client = &self.client;
        poll_until(
            Duration::from_millis(250),
            timeout,
            &format!("page text to contain '{}'", text),
            move || async move {
                match client.execute(script, vec![]).await {
                    Ok(v) => v.as_str().map(|s| s.contains(text)).unwrap_or(false),
                    Err(_) => false,
                }
            },
        )
        .await
    }

    /// Inject a console.* shim that buffers messages on the page so debug
    /// commands can read them back after the fact
    async fn install_console_capture(&self) -> Result<()> {
        let capture_script = r#"
            (function() {
                if (window.__chiprobe_console_capture) return;
                window.__chiprobe_console_capture = true;
                window.__chiprobe_console_logs = [];

                function capture(level, args) {
                    var message = Array.from(args).map(function(arg) {
                        if (typeof arg === 'object') {
                            try { return JSON.stringify(arg); }
                            catch (e) { return String(arg); }
                        }
                        return String(arg);
                    }).join(' ');

                    window.__chiprobe_console_logs.push({
                        level: level,
                        message: message,
                        timestamp: new Date().toISOString()
                    });

                    if (window.__chiprobe_console_logs.length > 1000) {
                        window.__chiprobe_console_logs.shift();
                    }
                }

                ['log', 'error', 'warn', 'info'].forEach(function(level) {
                    var original = console[level];
                    console[level] = function() {
                        capture(level, arguments);
                        original.apply(console, arguments);
                    };
                });

                window.addEventListener('error', function(event) {
                    capture('error', ['Uncaught ' + (event.error || event.message)]);
                });
                window.addEventListener('unhandledrejection', function(event) {
                    capture('error', ['Unhandled Promise Rejection: ' + event.reason]);
                });
            })();
        "#;

        // Best effort: some pages refuse injected script
        let _ = self.client.execute(capture_script, vec![]).await;
        Ok(())
    }

    /// Drain captured console messages from the page
    pub async fn console_logs(&self) -> Result<Vec<ConsoleMessage>> {
        let script = "return window.__chiprobe_console_logs || [];";
        match self.client.execute(script, vec![]).await {
            Ok(value) => Ok(serde_json::from_value(value).unwrap_or_default()),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Read a localStorage key, if present
    pub async fn local_storage(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .client
            .execute(
                "return window.localStorage.getItem(arguments[0]);",
                vec![json!(key)],
            )
            .await?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    /// Read a cookie value by name, if present
    pub async fn cookie(&self, name: &str) -> Result<Option<String>> {
        match self.client.get_named_cookie(name).await {
            Ok(cookie) => Ok(Some(cookie.value().to_string())),
            Err(_) => Ok(None),
        }
    }

    /// Capture a PNG screenshot named after the step, under the artifacts dir
    pub async fn screenshot(&self, step: &str, artifacts_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(artifacts_dir).with_context(|| {
            format!("Failed to create artifacts dir {}", artifacts_dir.display())
        })?;
        let png = self.client.screenshot().await?;
        let path = screenshot_path(artifacts_dir, step);
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write screenshot to {}", path.display()))?;
        info!("Saved screenshot {}", path.display());
        Ok(path)
    }

    /// End the WebDriver session
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
