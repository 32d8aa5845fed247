use anyhow::{Context, Result};
use std::path::PathBuf;
use url::Url;

/// Which Chi War deployment the harness is pointed at
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Environment {
    /// Test servers (backend 3004, frontend 3005)
    Test,
    /// Dev servers (backend 3000, frontend 3001)
    Dev,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    /// Parse environment from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "dev" | "development" => Ok(Environment::Dev),
            _ => anyhow::bail!("Unknown environment: {} (expected test or dev)", s),
        }
    }
}

impl Environment {
    pub fn label(&self) -> &'static str {
        match self {
            Environment::Test => "test",
            Environment::Dev => "dev",
        }
    }

    fn default_backend_url(&self) -> &'static str {
        match self {
            Environment::Test => "http://localhost:3004",
            Environment::Dev => "http://localhost:3000",
        }
    }

    fn default_frontend_url(&self) -> &'static str {
        match self {
            Environment::Test => "http://localhost:3005",
            Environment::Dev => "http://localhost:3001",
        }
    }
}

/// Per-run harness configuration, built once in main and passed by reference.
///
/// Replaces the ambient TEST_CONFIG-style globals the original scripts leaned
/// on: every URL, directory, and credential the harness needs comes from here.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub environment: Environment,
    pub backend_url: Url,
    pub frontend_url: Url,
    /// Where screenshots and the JSON run report are written
    pub artifacts_dir: PathBuf,
    /// Admin credentials for login smoke tests, if provided
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Checkouts to spawn dev servers / the backend suite from, if provided
    pub backend_dir: Option<PathBuf>,
    pub frontend_dir: Option<PathBuf>,
}

impl HarnessConfig {
    /// Build configuration from environment variables.
    ///
    /// `CHIPROBE_ENV` selects test (default) or dev port pairs;
    /// `CHIWAR_BACKEND_URL` / `CHIWAR_FRONTEND_URL` override the URLs outright.
    pub fn from_env() -> Result<Self> {
        let environment: Environment = match std::env::var("CHIPROBE_ENV") {
            Ok(v) => v.parse()?,
            Err(_) => Environment::Test,
        };
        Self::from_env_with(environment)
    }

    /// Build configuration for an explicit environment, still honoring
    /// URL and directory overrides from the process environment.
    pub fn from_env_with(environment: Environment) -> Result<Self> {
        let backend_url = std::env::var("CHIWAR_BACKEND_URL")
            .unwrap_or_else(|_| environment.default_backend_url().to_string());
        let frontend_url = std::env::var("CHIWAR_FRONTEND_URL")
            .unwrap_or_else(|_| environment.default_frontend_url().to_string());

        let artifacts_dir = std::env::var("CHIPROBE_ARTIFACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("test-results"));

        Ok(Self {
            environment,
            backend_url: Url::parse(&backend_url)
                .with_context(|| format!("Invalid backend URL: {}", backend_url))?,
            frontend_url: Url::parse(&frontend_url)
                .with_context(|| format!("Invalid frontend URL: {}", frontend_url))?,
            artifacts_dir,
            admin_email: std::env::var("CHIWAR_ADMIN_EMAIL").ok(),
            admin_password: std::env::var("CHIWAR_ADMIN_PASSWORD").ok(),
            backend_dir: std::env::var("CHIWAR_BACKEND_DIR").ok().map(PathBuf::from),
            frontend_dir: std::env::var("CHIWAR_FRONTEND_DIR").ok().map(PathBuf::from),
        })
    }

    /// Join a path onto the backend base URL
    pub fn backend_api(&self, path: &str) -> Result<Url> {
        self.backend_url
            .join(path)
            .with_context(|| format!("Invalid backend path: {}", path))
    }

    /// Join a path onto the frontend base URL
    pub fn frontend_page(&self, path: &str) -> Result<Url> {
        self.frontend_url
            .join(path)
            .with_context(|| format!("Invalid frontend path: {}", path))
    }

    /// Admin credentials, or a clear error telling the operator what to set.
    /// Local dev credentials are never baked into the binary.
    pub fn admin_credentials(&self) -> Result<(String, String)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(e), Some(p)) => Ok((e.clone(), p.clone())),
            _ => anyhow::bail!(
                "Admin credentials not configured. \
                 Set CHIWAR_ADMIN_EMAIL and CHIWAR_ADMIN_PASSWORD."
            ),
        }
    }

    /// Backend checkout directory, or a clear error
    pub fn backend_dir(&self) -> Result<&PathBuf> {
        self.backend_dir
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("CHIWAR_BACKEND_DIR is not set"))
    }

    /// Frontend checkout directory, or a clear error
    pub fn frontend_dir(&self) -> Result<&PathBuf> {
        self.frontend_dir
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("CHIWAR_FRONTEND_DIR is not set"))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
