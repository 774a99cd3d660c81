//! Monitor command handlers
//!
//! Runs a monitoring session in the foreground. Progress lines go to stderr
//! and the final report is printed to stdout as JSON.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use jobwatch_core::domain::job::JobId;
use jobwatch_monitor::{CheckpointReader, JobMonitor, MonitorConfig, MonitorResult};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;

/// Exit code reported when the session is cancelled with Ctrl-C
const EXIT_CANCELLED: u8 = 130;

/// Polling options shared by `monitor` and `submit --watch`
///
/// Unset options fall back to the JOBWATCH_* environment variables and then
/// to the built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Seconds between two status polls
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Unchanged-progress polls tolerated before the job counts as stalled
    #[arg(long, value_name = "N")]
    pub max_stuck: Option<u32>,

    /// Wall-time ceiling of the session in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of polls
    #[arg(long, value_name = "N")]
    pub max_polls: Option<u32>,

    /// Do not consult checkpoints when the job does not succeed
    #[arg(long)]
    pub no_checkpoints: bool,
}

impl WatchArgs {
    /// Applies the command-line overrides on top of `config`
    pub fn apply(&self, mut config: MonitorConfig) -> MonitorConfig {
        if let Some(secs) = self.interval {
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Some(n) = self.max_stuck {
            config.max_stuck_polls = n;
        }

        if let Some(secs) = self.timeout {
            config.max_duration = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if self.max_polls.is_some() {
            config.max_polls = self.max_polls;
        }

        if self.no_checkpoints {
            config.inspect_checkpoints = false;
        }

        config
    }
}

/// Arguments of the `monitor` command
#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    /// Job ID
    pub job_id: String,

    #[command(flatten)]
    pub watch: WatchArgs,
}

pub async fn handle_monitor_command(args: MonitorArgs, config: &Config) -> Result<ExitCode> {
    let monitor = build_monitor(&args.watch, config)?;
    let cancel = cancel_on_ctrl_c();
    let job_id = JobId::new(args.job_id);

    let result = monitor
        .monitor_with(&job_id, &cancel, print_progress)
        .await
        .with_context(|| format!("Failed to monitor job {}", job_id))?;

    report(result)
}

/// Builds a monitor from the environment, the command line and the API config
pub(crate) fn build_monitor(args: &WatchArgs, config: &Config) -> Result<JobMonitor> {
    let monitor_config = MonitorConfig::from_env()
        .context("Invalid monitor configuration in environment")?;
    let mut monitor_config = args.apply(monitor_config);

    let client = Arc::new(config.client()?);
    monitor_config.request_timeout = client.config().request_timeout;
    let monitor = JobMonitor::new(client.clone(), monitor_config)?;

    Ok(if monitor.config().inspect_checkpoints {
        monitor.with_checkpoints(CheckpointReader::new(client))
    } else {
        monitor
    })
}

/// Token cancelled on the first Ctrl-C
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current poll");
            trigger.cancel();
        }
    });

    cancel
}

pub(crate) fn print_progress(line: &str) {
    eprintln!("{}", line.dimmed());
}

/// Prints the session result and maps it to an exit code
pub(crate) fn report(result: MonitorResult) -> Result<ExitCode> {
    match result {
        MonitorResult::Finished(report) => {
            if report.outcome.is_success() {
                eprintln!("{} {}", "✓".green().bold(), report);
            } else {
                eprintln!("{} {}", "✗".red().bold(), report.to_string().red());
            }

            let json = report
                .to_json_pretty()
                .context("Failed to serialize monitoring report")?;
            println!("{}", json);

            Ok(ExitCode::from(
                u8::try_from(report.outcome.exit_code()).unwrap_or(1),
            ))
        }
        MonitorResult::Cancelled { job_id, polls, .. } => {
            eprintln!(
                "{}",
                format!("Monitoring of job {} cancelled after {} poll(s)", job_id, polls).yellow()
            );
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
    }
}
