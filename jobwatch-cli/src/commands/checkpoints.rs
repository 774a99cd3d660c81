//! Checkpoint command handlers
//!
//! Shows the execution history a job left behind. Useful for finding the
//! stage a stalled or interrupted job was in.

use anyhow::{Context, Result};
use colored::*;
use jobwatch_client::JobClient;
use jobwatch_core::domain::checkpoint::Checkpoint;
use jobwatch_core::domain::job::JobId;
use jobwatch_monitor::{CheckpointReader, JobHistory};
use std::process::ExitCode;
use std::sync::Arc;

use super::job::colorize_state;
use crate::config::Config;

pub async fn handle_checkpoints_command(id: &str, latest: bool, config: &Config) -> Result<ExitCode> {
    let client = Arc::new(config.client()?);
    let job_id = JobId::from(id);

    let status = client
        .fetch_status(&job_id)
        .await
        .with_context(|| format!("Failed to fetch status of job {}", job_id))?;

    let history = CheckpointReader::new(client)
        .reconstruct(&status)
        .await
        .with_context(|| format!("Failed to read checkpoints of job {}", job_id))?;

    print_history_header(&history);

    if history.checkpoints.is_empty() {
        println!("{}", "No checkpoints found for this job.".yellow());
    } else if latest {
        println!(
            "{}",
            format!("Latest checkpoint of {} stage(s):", history.latest_by_stage.len()).bold()
        );
        for checkpoint in history.latest_by_stage.values() {
            print_checkpoint(checkpoint);
        }
    } else {
        println!(
            "{}",
            format!("Found {} checkpoint(s):", history.checkpoints.len()).bold()
        );
        println!("{}", "─".repeat(80).dimmed());
        for checkpoint in history.checkpoints.iter() {
            print_checkpoint(checkpoint);
        }
        println!("{}", "─".repeat(80).dimmed());
    }

    Ok(ExitCode::SUCCESS)
}

fn print_history_header(history: &JobHistory) {
    println!("{}", "Job History:".bold());
    println!("  ID:        {}", history.job_id.to_string().cyan());
    println!(
        "  State:     {} ({}%)",
        colorize_state(history.state),
        history.progress
    );

    if let Some(stage) = &history.current_stage {
        println!("  Stage:     {}", stage);
    }

    if let Some(stage) = &history.resume_stage {
        println!("  Resume at: {}", stage.magenta());
    }

    if !history.stages.is_empty() {
        println!("  Stages:    {}", history.stages.join(" → ").dimmed());
    }

    if let Some(error) = &history.error_message {
        println!("  Error:     {}", error.red());
    }

    println!();
}

fn print_checkpoint(checkpoint: &Checkpoint) {
    println!(
        "{} {}",
        checkpoint
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed(),
        checkpoint.stage.cyan()
    );

    for (key, value) in &checkpoint.data {
        println!("    {} = {}", key.dimmed(), value);
    }
}
