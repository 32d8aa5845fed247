//! Spawning and tearing down the application under test.
//!
//! The backend and frontend dev servers are started as child processes in
//! their own Unix process groups so the whole tree (rails + spring, node +
//! workers) can be torn down, then gated on readiness probes before any flow
//! runs. Also shells out to the backend's own test suite.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::readiness::ReadinessProbe;

/// One spawned dev server
struct ManagedServer {
    name: String,
    child: Child,
    #[cfg(unix)]
    process_group_id: Option<i32>,
}

/// Outcome of shelling out to the backend test suite
#[derive(Debug)]
pub struct SuiteOutcome {
    pub passed: bool,
    pub output: String,
}

#[derive(Default)]
pub struct ServerManager {
    servers: Vec<ManagedServer>,
}

impl ServerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the backend server and block until its health endpoint answers
    pub async fn start_backend(&mut self, config: &HarnessConfig) -> Result<()> {
        let dir = config.backend_dir()?.clone();
        let port = config.backend_url.port().unwrap_or(3004);
        let command = std::env::var("CHIWAR_BACKEND_CMD").unwrap_or_else(|_| {
            format!("bundle exec rails server -p {}", port)
        });

        self.spawn("backend", &dir, &command, &[("RAILS_ENV", config.environment.label())])?;

        let probe = ReadinessProbe::new("backend", config.backend_api("/api/v2/users/current")?);
        probe.wait(&reqwest::Client::new()).await?;
        Ok(())
    }

    /// Start the frontend dev server and block until it serves pages
    pub async fn start_frontend(&mut self, config: &HarnessConfig) -> Result<()> {
        let dir = config.frontend_dir()?.clone();
        let port = config.frontend_url.port().unwrap_or(3005);
        let command =
            std::env::var("CHIWAR_FRONTEND_CMD").unwrap_or_else(|_| "npm run dev".to_string());
        let port_value = port.to_string();

        self.spawn("frontend", &dir, &command, &[("PORT", port_value.as_str())])?;

        let probe = ReadinessProbe::new("frontend", config.frontend_page("/")?);
        probe.wait(&reqwest::Client::new()).await?;
        Ok(())
    }

    fn spawn(&mut self, name: &str, dir: &Path, command: &str, env: &[(&str, &str)]) -> Result<()> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty command for {}", name))?;

        info!("Starting {} in {}: {}", name, dir.display(), command);

        let mut cmd = Command::new(program);
        cmd.args(parts)
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in env {
            cmd.env(key, value);
        }

        // New process group so the entire tree can be killed together
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to start {} ({})", name, command))?;

        #[cfg(unix)]
        let process_group_id = Some(child.id() as i32);

        self.servers.push(ManagedServer {
            name: name.to_string(),
            child,
            #[cfg(unix)]
            process_group_id,
        });
        Ok(())
    }

    /// Run the backend's own test suite and decide pass/fail from the exit
    /// status plus a scan of the summary output. The scan can only downgrade
    /// an apparent pass (a zero exit with a nonzero failure count), never
    /// rescue a failing exit status.
    pub fn run_backend_suite(&self, config: &HarnessConfig) -> Result<SuiteOutcome> {
        let dir = config.backend_dir()?;
        let command =
            std::env::var("CHIWAR_BACKEND_SUITE_CMD").unwrap_or_else(|_| "bundle exec rspec".into());

        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty backend suite command"))?;

        info!("Running backend suite in {}: {}", dir.display(), command);

        let output = Command::new(program)
            .args(parts)
            .current_dir(dir)
            .env("RAILS_ENV", "test")
            .output()
            .with_context(|| format!("Failed to run backend suite ({})", command))?;

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        let passed = output.status.success() && !suite_output_indicates_failure(&text);
        if passed {
            info!("Backend suite passed");
        } else {
            warn!("Backend suite failed (exit: {:?})", output.status.code());
        }

        Ok(SuiteOutcome { passed, output: text })
    }

    /// Stop every managed server, killing the whole process group
    pub fn stop_all(&mut self) {
        for server in &mut self.servers {
            debug!("Stopping {}", server.name);

            #[cfg(unix)]
            if let Some(pgid) = server.process_group_id {
                info!("Killing process group {} for {}", pgid, server.name);
                kill_process_group(pgid);
            }

            let _ = server.child.kill();
        }
        self.servers.clear();
    }
}

impl Drop for ServerManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Kill a process group on Unix: SIGTERM first, then SIGKILL for stragglers
#[cfg(unix)]
fn kill_process_group(pgid: i32) {
    if let Err(e) = Command::new("kill")
        .args(["-TERM", &format!("-{}", pgid)])
        .output()
    {
        debug!("Failed to send SIGTERM to process group {}: {}", pgid, e);
    }

    std::thread::sleep(Duration::from_millis(100));

    if let Err(e) = Command::new("kill")
        .args(["-KILL", &format!("-{}", pgid)])
        .output()
    {
        debug!("Failed to send SIGKILL to process group {}: {}", pgid, e);
    }
}

/// Look for a "N failures" summary line with a nonzero N (rspec, minitest,
/// and jest all print one)
fn suite_output_indicates_failure(output: &str) -> bool {
    for line in output.lines() {
        let mut words = line.split_whitespace().peekable();
        while let Some(word) = words.next() {
            if let Ok(count) = word.parse::<u64>() {
                if let Some(next) = words.peek() {
                    let next = next.trim_end_matches([',', '.']);
                    if (next == "failures" || next == "failure" || next == "failed") && count > 0 {
                        return true;
                    }
                }
            }
        }
    }
    false
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod runner_test;
