//! Typed locator strategies and the fallback-chain resolver.
//!
//! The Chi War frontend is not annotated with stable test identifiers
//! everywhere, so a semantic intent ("the create button") maps to an ordered
//! list of plausible markups. Candidates are tried in order and the first one
//! that resolves within its timeout wins; a per-candidate timeout is a signal
//! to try the next candidate, not an error.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default visibility timeout for each candidate in a chain
pub const DEFAULT_CANDIDATE_TIMEOUT: Duration = Duration::from_millis(1500);

/// A single way of locating an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocatorStrategy {
    /// Match on a `data-testid` attribute
    TestId(String),
    /// Match on exact visible text content
    Text(String),
    /// Raw CSS selector
    Css(String),
}

impl LocatorStrategy {
    /// CSS rendering of this strategy, if it has one
    pub fn as_css(&self) -> Option<String> {
        match self {
            LocatorStrategy::TestId(id) => Some(format!("[data-testid=\"{}\"]", id)),
            LocatorStrategy::Css(css) => Some(css.clone()),
            LocatorStrategy::Text(_) => None,
        }
    }

    /// XPath rendering of this strategy, if it has one
    pub fn as_xpath(&self) -> Option<String> {
        match self {
            LocatorStrategy::Text(text) => Some(format!(
                "//*[normalize-space(text())={}]",
                xpath_literal(text)
            )),
            _ => None,
        }
    }
}

impl std::fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocatorStrategy::TestId(id) => write!(f, "test-id:{}", id),
            LocatorStrategy::Text(text) => write!(f, "text:{}", text),
            LocatorStrategy::Css(css) => write!(f, "css:{}", css),
        }
    }
}

/// Quote a string as an XPath literal. XPath 1.0 has no escape syntax, so
/// strings containing both quote kinds need a concat() expression.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[derive(Debug, Error)]
pub enum LocatorError {
    /// Every candidate was tried and none matched a visible element
    #[error("No candidate selector matched for: {intent} (tried: {tried})")]
    Exhausted { intent: String, tried: String },
}

/// The candidate that matched, and what it resolved to
#[derive(Debug)]
pub struct Resolved<T> {
    pub value: T,
    pub strategy: LocatorStrategy,
}

/// An ordered list of locator strategies for one semantic intent
#[derive(Debug, Clone)]
pub struct FallbackChain {
    intent: String,
    candidates: Vec<LocatorStrategy>,
    candidate_timeout: Duration,
}

impl FallbackChain {
    pub fn new(intent: impl Into<String>, candidates: Vec<LocatorStrategy>) -> Self {
        Self {
            intent: intent.into(),
            candidates,
            candidate_timeout: DEFAULT_CANDIDATE_TIMEOUT,
        }
    }

    pub fn with_candidate_timeout(mut self, timeout: Duration) -> Self {
        self.candidate_timeout = timeout;
        self
    }

    pub fn intent(&self) -> &str {
        &self.intent
    }

    pub fn candidates(&self) -> &[LocatorStrategy] {
        &self.candidates
    }

    /// Try each candidate in order against `probe`, short-circuiting on the
    /// first hit. `probe` returns `Some` when the candidate matched a visible
    /// element; `None` (or exceeding the candidate timeout) moves on to the
    /// next candidate.
    pub async fn resolve_with<T, F, Fut>(&self, mut probe: F) -> Result<Resolved<T>, LocatorError>
    where
        F: FnMut(LocatorStrategy) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        match self.try_resolve_with(&mut probe).await {
            Some(resolved) => Ok(resolved),
            None => Err(LocatorError::Exhausted {
                intent: self.intent.clone(),
                tried: self
                    .candidates
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Like [`resolve_with`](Self::resolve_with), but exhaustion is the
    /// caller's problem — some callers treat a missing control as "navigate
    /// directly instead" rather than a failure.
    pub async fn try_resolve_with<T, F, Fut>(&self, mut probe: F) -> Option<Resolved<T>>
    where
        F: FnMut(LocatorStrategy) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for candidate in &self.candidates {
            let attempt = tokio::time::timeout(self.candidate_timeout, probe(candidate.clone()));
            match attempt.await {
                Ok(Some(value)) => {
                    debug!("Resolved '{}' via {}", self.intent, candidate);
                    return Some(Resolved {
                        value,
                        strategy: candidate.clone(),
                    });
                }
                Ok(None) => {
                    debug!("Candidate {} did not match for '{}'", candidate, self.intent);
                }
                Err(_) => {
                    debug!("Candidate {} timed out for '{}'", candidate, self.intent);
                }
            }
        }
        None
    }
}

/// Common chains for controls the flows touch repeatedly

pub fn submit_button() -> FallbackChain {
    FallbackChain::new(
        "the submit button",
        vec![
            LocatorStrategy::TestId("submit-button".into()),
            LocatorStrategy::Css("button[type='submit']".into()),
            LocatorStrategy::Text("Submit".into()),
        ],
    )
}

pub fn create_button(noun: &str) -> FallbackChain {
    FallbackChain::new(
        format!("the create {} button", noun),
        vec![
            LocatorStrategy::TestId(format!("create-{}-button", noun)),
            LocatorStrategy::TestId("create-button".into()),
            LocatorStrategy::Text("Create".into()),
            LocatorStrategy::Css("button.create".into()),
        ],
    )
}

pub fn name_field() -> FallbackChain {
    FallbackChain::new(
        "the name field",
        vec![
            LocatorStrategy::TestId("name-field".into()),
            LocatorStrategy::Css("input[name='name']".into()),
            LocatorStrategy::Css("input#name".into()),
        ],
    )
}

pub fn email_field() -> FallbackChain {
    FallbackChain::new(
        "the email field",
        vec![
            LocatorStrategy::TestId("email-field".into()),
            LocatorStrategy::Css("input[type='email']".into()),
            LocatorStrategy::Css("input[name='email']".into()),
        ],
    )
}

pub fn password_field() -> FallbackChain {
    FallbackChain::new(
        "the password field",
        vec![
            LocatorStrategy::TestId("password-field".into()),
            LocatorStrategy::Css("input[type='password']".into()),
            LocatorStrategy::Css("input[name='password']".into()),
        ],
    )
}

#[cfg(test)]
#[path = "locator_test.rs"]
mod locator_test;
