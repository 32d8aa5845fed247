use std::fmt;

/// Custom error type that includes exit codes
#[derive(Debug)]
pub enum HarnessError {
    /// Element not found after exhausting a fallback chain (exit code 2)
    ElementNotFound(String),
    /// Backend returned a status the flow cannot proceed from (exit code 3)
    UnexpectedStatus { status: u16, body: String },
    /// Service did not become ready within its attempt budget (exit code 4)
    ServiceUnavailable { service: String, attempts: u32 },
    /// Operation timeout (exit code 5)
    Timeout(String),
    /// Expected state did not materialize after an action (exit code 6)
    AssertionFailed(String),
    /// Generic error (exit code 1)
    Other(anyhow::Error),
}

impl HarnessError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            HarnessError::ElementNotFound(_) => 2,
            HarnessError::UnexpectedStatus { .. } => 3,
            HarnessError::ServiceUnavailable { .. } => 4,
            HarnessError::Timeout(_) => 5,
            HarnessError::AssertionFailed(_) => 6,
            HarnessError::Other(_) => 1,
        }
    }

    /// Short machine-readable reason code for reports
    pub fn reason_code(&self) -> &'static str {
        match self {
            HarnessError::ElementNotFound(_) => "element_not_found",
            HarnessError::UnexpectedStatus { .. } => "unexpected_status",
            HarnessError::ServiceUnavailable { .. } => "service_unavailable",
            HarnessError::Timeout(_) => "timeout",
            HarnessError::AssertionFailed(_) => "assertion_failed",
            HarnessError::Other(_) => "error",
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::ElementNotFound(intent) => {
                write!(f, "No candidate selector matched for: {}", intent)
            }
            HarnessError::UnexpectedStatus { status, body } => {
                write!(f, "Unexpected HTTP status {}: {}", status, body)
            }
            HarnessError::ServiceUnavailable { service, attempts } => {
                write!(
                    f,
                    "{} did not become ready within {} attempts",
                    service, attempts
                )
            }
            HarnessError::Timeout(msg) => {
                write!(f, "Operation timed out: {}", msg)
            }
            HarnessError::AssertionFailed(msg) => {
                write!(f, "Assertion failed: {}", msg)
            }
            HarnessError::Other(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for HarnessError {
    fn from(err: anyhow::Error) -> Self {
        // Recover the typed error if one is buried in the chain
        match err.downcast::<HarnessError>() {
            Ok(typed) => typed,
            Err(err) => {
                // Fall back to detecting the category from the message
                let msg = err.to_string();

                if msg.contains("No candidate selector matched") {
                    HarnessError::ElementNotFound(msg)
                } else if msg.contains("did not become ready") {
                    HarnessError::ServiceUnavailable {
                        service: "unknown".to_string(),
                        attempts: 0,
                    }
                } else if msg.contains("timeout") || msg.contains("timed out") {
                    HarnessError::Timeout(msg)
                } else {
                    HarnessError::Other(err)
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
