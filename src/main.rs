use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod browser;
mod commands;
mod config;
mod errors;
mod locator;
mod readiness;
mod report;
mod roundtrip;
mod runner;
mod session;

use commands::flow::FlowName;
use config::{Environment, HarnessConfig};

#[derive(Parser)]
#[command(name = "chiprobe")]
#[command(about = "End-to-end smoke-test and debug harness for Chi War", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Target environment (test or dev port pair)
    #[arg(long, global = true)]
    env: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for the backend and frontend to accept requests
    Ready {
        /// Maximum health-check attempts per service
        #[arg(long, default_value = "30")]
        attempts: u32,

        /// Fixed delay between attempts, in seconds
        #[arg(long, default_value = "2")]
        delay: u64,

        /// Only check the backend
        #[arg(long)]
        backend_only: bool,
    },

    /// Sign in and verify the token is accepted
    Login {
        /// Email (defaults to CHIWAR_ADMIN_EMAIL)
        #[arg(long)]
        email: Option<String>,

        /// Password (defaults to CHIWAR_ADMIN_PASSWORD)
        #[arg(long)]
        password: Option<String>,

        /// Drive the login form in a real browser and assert the
        /// jwtToken cookie, instead of calling the API directly
        #[arg(long)]
        via_ui: bool,

        /// Browser to use for --via-ui
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Run the browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,
    },

    /// API smoke test: readiness, sign-in, campaign round trip
    Smoke,

    /// Drive a browser flow end to end
    Flow {
        /// Which flow to run
        #[arg(value_enum)]
        name: FlowName,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Run the browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,
    },

    /// Navigate to a page and dump its state for debugging
    Inspect {
        /// URL to inspect
        url: String,

        /// Wait for this text to appear before reporting
        #[arg(long)]
        wait_text: Option<String>,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Run the browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,
    },

    /// Start the servers, run the selected suites, tear down
    Run {
        /// Run the backend's own test suite
        #[arg(long)]
        suite: bool,

        /// Run the API smoke flow
        #[arg(long)]
        smoke: bool,

        /// Use already-running servers instead of spawning them
        #[arg(long)]
        no_spawn: bool,
    },
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(()) => {}
        Err(err) => {
            // Convert to the typed error to get the right exit code
            let harness_err: errors::HarnessError = err.into();

            // JSON error object on stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "reason": harness_err.reason_code(),
                "message": harness_err.to_string(),
                "exit_code": harness_err.exit_code(),
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            // And on stderr for humans
            eprintln!("Error: {}", harness_err);
            std::process::exit(harness_err.exit_code());
        }
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so stdout stays clean for JSON output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chiprobe=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.env {
        Some(env) => HarnessConfig::from_env_with(env.parse::<Environment>()?)?,
        None => HarnessConfig::from_env()?,
    };

    match cli.command {
        Commands::Ready {
            attempts,
            delay,
            backend_only,
        } => commands::ready::handle_ready(&config, attempts, delay, backend_only).await?,

        Commands::Login {
            email,
            password,
            via_ui,
            browser,
            no_headless,
        } => {
            commands::login::handle_login(&config, email, password, via_ui, browser, no_headless)
                .await?
        }

        Commands::Smoke => commands::smoke::handle_smoke(&config).await?,

        Commands::Flow {
            name,
            browser,
            no_headless,
        } => commands::flow::handle_flow(&config, name, browser, no_headless).await?,

        Commands::Inspect {
            url,
            wait_text,
            browser,
            no_headless,
        } => commands::inspect::handle_inspect(&config, url, wait_text, browser, no_headless).await?,

        Commands::Run {
            suite,
            smoke,
            no_spawn,
        } => commands::run::handle_run(&config, suite, smoke, no_spawn).await?,
    }

    Ok(())
}
