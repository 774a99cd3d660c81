//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod checkpoints;
mod job;
mod monitor;

use job::SubmitArgs;
use monitor::MonitorArgs;

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Watch a job until it completes, fails, stalls or times out
    Monitor(MonitorArgs),
    /// Submit a document for processing
    Submit(SubmitArgs),
    /// Show the current status of a job
    Status {
        /// Job ID
        id: String,
    },
    /// Show the checkpoint history of a job
    Checkpoints {
        /// Job ID
        id: String,

        /// Only show the most recent checkpoint of each stage
        #[arg(long)]
        latest: bool,
    },
    /// Delete a job that is stuck in the interrupted state
    Clear {
        /// Job ID
        id: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module and returns the
/// process exit code.
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Monitor(args) => monitor::handle_monitor_command(args, config).await,
        Commands::Submit(args) => job::handle_submit_command(args, config).await,
        Commands::Status { id } => job::show_status(&id, config).await,
        Commands::Checkpoints { id, latest } => {
            checkpoints::handle_checkpoints_command(&id, latest, config).await
        }
        Commands::Clear { id } => job::clear_job(&id, config).await,
    }
}
