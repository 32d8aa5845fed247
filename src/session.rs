//! Per-run session values: throwaway credentials, collision-proof entity
//! names, and the bearer token the backend hands back on sign-in. Nothing
//! here outlives one harness invocation.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Monotonic per-process counter so suffixes minted within the same
/// millisecond still differ
static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Email/password pair generated fresh per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Unique credentials so repeated runs never collide on the email column
    pub fn unique(prefix: &str) -> Self {
        let suffix = run_suffix();
        Self {
            email: format!("{}-{}@chiprobe.test", prefix, suffix),
            password: format!("Pw-{}!", suffix),
        }
    }
}

/// Entity name (campaign, character, faction, party, site, fight) with a
/// uniqueness suffix, mirroring the Date.now() naming the original scripts
/// used to survive repeated runs against the same database.
pub fn unique_name(kind: &str) -> String {
    format!("{} {}", kind, run_suffix())
}

fn run_suffix() -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let salt: u32 = rand::thread_rng().gen();
    format!("{}-{}-{:08x}", millis, seq, salt)
}

/// Bearer/JWT credential from a sign-in response. Held for the run; no
/// refresh or expiry handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken(String);

impl AuthToken {
    /// From an `Authorization` response header, with or without the
    /// `Bearer ` prefix
    pub fn from_header_value(value: &str) -> Option<Self> {
        let raw = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    /// From a `jwtToken` cookie value
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        let raw = value.trim();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    /// Value for an `Authorization` request header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for status lines, never the full secret
    pub fn preview(&self) -> String {
        let mut chars = self.0.chars();
        let head: String = chars.by_ref().take(12).collect();
        if chars.next().is_none() {
            head
        } else {
            format!("{}…", head)
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
