//! Jobwatch CLI
//!
//! Command-line interface for submitting documents to the processing API
//! and monitoring the resulting jobs.

mod commands;
mod config;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::Config;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jobwatch")]
#[command(about = "Document-processing job monitor", long_about = None)]
struct Cli {
    /// API base URL [default: http://localhost:8000]
    #[arg(long, env = "JOBWATCH_API_URL")]
    api_url: Option<String>,

    /// Path prefix of the API endpoints [default: /api/v1]
    #[arg(long, env = "JOBWATCH_API_PREFIX")]
    api_prefix: Option<String>,

    /// Bearer token for the API
    #[arg(long, env = "JOBWATCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Timeout of a single HTTP request in seconds [default: 30]
    #[arg(long, env = "JOBWATCH_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        api_prefix: cli.api_prefix,
        api_key: cli.api_key,
        request_timeout: cli.request_timeout.map(Duration::from_secs),
    };

    match handle_command(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
