//! Job command handlers
//!
//! Handles submitting documents, viewing job status and clearing
//! interrupted jobs.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use colored::*;
use jobwatch_client::JobClient;
use jobwatch_core::domain::job::{JobId, JobState, JobStatus};
use jobwatch_core::dto::job::{ProcessingOptions, SubmitJobRequest};
use jobwatch_monitor::{ClearResult, JobMonitor, MonitorConfig};
use std::process::ExitCode;
use std::sync::Arc;

use super::monitor::{self, WatchArgs};
use crate::config::Config;

/// Arguments of the `submit` command
#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["document_id", "document_url"])
))]
pub struct SubmitArgs {
    /// ID of a document already uploaded to the API
    #[arg(long)]
    pub document_id: Option<String>,

    /// URL the API should fetch the document from
    #[arg(long)]
    pub document_url: Option<String>,

    /// Target chunk size in characters
    #[arg(long, default_value = "1000")]
    pub chunk_size: u32,

    /// Overlap between consecutive chunks
    #[arg(long, default_value = "200")]
    pub chunk_overlap: u32,

    /// Skip image extraction
    #[arg(long)]
    pub no_images: bool,

    /// Extract tables
    #[arg(long)]
    pub tables: bool,

    /// Skip embedding generation
    #[arg(long)]
    pub no_embeddings: bool,

    /// Monitor the job after submitting it
    #[arg(short, long)]
    pub watch: bool,

    #[command(flatten)]
    pub watch_args: WatchArgs,
}

impl SubmitArgs {
    pub fn to_request(&self) -> SubmitJobRequest {
        let request = match (&self.document_id, &self.document_url) {
            (Some(id), _) => SubmitJobRequest::for_document(id),
            (None, Some(url)) => SubmitJobRequest::for_url(url),
            (None, None) => SubmitJobRequest::default(),
        };

        request.with_options(ProcessingOptions {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            extract_images: !self.no_images,
            extract_tables: self.tables,
            enable_embeddings: !self.no_embeddings,
        })
    }
}

/// Submit a document, optionally monitoring the resulting job
pub async fn handle_submit_command(args: SubmitArgs, config: &Config) -> Result<ExitCode> {
    let request = args.to_request();

    if args.watch {
        let job_monitor = monitor::build_monitor(&args.watch_args, config)?;
        let cancel = monitor::cancel_on_ctrl_c();
        let result = job_monitor
            .submit_and_monitor(&request, &cancel, monitor::print_progress)
            .await?;
        return monitor::report(result);
    }

    let client = config.client()?;
    let response = client
        .submit(&request)
        .await
        .context("Failed to submit document")?;

    println!("{}", "✓ Job submitted successfully!".green().bold());
    println!("  Job ID: {}", response.job_id.to_string().cyan());
    if let Some(document_id) = &response.document_id {
        println!("  Document: {}", document_id.dimmed());
    }
    println!();
    println!(
        "{}",
        format!("Watch it with: jobwatch monitor {}", response.job_id).dimmed()
    );

    Ok(ExitCode::SUCCESS)
}

/// Get and display the status of a single job
pub async fn show_status(id: &str, config: &Config) -> Result<ExitCode> {
    let client = config.client()?;
    let status = client
        .fetch_status(&JobId::from(id))
        .await
        .with_context(|| format!("Failed to fetch status of job {}", id))?;

    print_status_details(&status);

    Ok(ExitCode::SUCCESS)
}

/// Delete a job, but only when it is interrupted
pub async fn clear_job(id: &str, config: &Config) -> Result<ExitCode> {
    let client = Arc::new(config.client()?);
    let monitor = JobMonitor::new(client, MonitorConfig::default())?;
    let job_id = JobId::from(id);

    match monitor.clear_interrupted(&job_id).await? {
        ClearResult::Deleted => {
            println!("{}", format!("✓ Interrupted job {} deleted", job_id).green());
            Ok(ExitCode::SUCCESS)
        }
        ClearResult::AlreadyAbsent => {
            println!("{}", format!("Job {} does not exist.", job_id).yellow());
            Ok(ExitCode::SUCCESS)
        }
        ClearResult::NotInterrupted(state) => {
            eprintln!(
                "{} job {} is {}, only interrupted jobs can be cleared",
                "✗".red().bold(),
                job_id,
                colorize_state(state)
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print detailed status information
fn print_status_details(status: &JobStatus) {
    println!("{}", "Job Status:".bold());
    println!("  ID:        {}", status.id.to_string().cyan());
    println!("  State:     {}", colorize_state(status.state));
    println!("  Progress:  {}%", status.progress);
    println!(
        "  Observed:  {}",
        status.observed_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(stage) = status.metadata.get("current_stage").and_then(|v| v.as_str()) {
        println!("  Stage:     {}", stage);
    }

    if let Some(error) = &status.error_message {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }

    if let Some(result) = &status.result_summary {
        println!("\n{}", "Result:".bold());
        for (key, value) in result {
            println!("  {} = {}", key.cyan(), value);
        }
    }
}

/// Colorize job state for display
pub(crate) fn colorize_state(state: JobState) -> ColoredString {
    let label = state.as_str();
    match state {
        JobState::Queued => label.yellow(),
        JobState::Processing => label.cyan(),
        JobState::Completed => label.green(),
        JobState::Failed => label.red(),
        JobState::Interrupted => label.magenta(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SubmitArgs {
        SubmitArgs {
            document_id: Some("doc-1".to_string()),
            document_url: None,
            chunk_size: 1000,
            chunk_overlap: 200,
            no_images: false,
            tables: false,
            no_embeddings: false,
            watch: false,
            watch_args: WatchArgs::default(),
        }
    }

    #[test]
    fn test_default_flags_match_default_options() {
        let request = args().to_request();
        assert_eq!(request.document_id.as_deref(), Some("doc-1"));
        assert_eq!(request.options, ProcessingOptions::default());
    }

    #[test]
    fn test_flags_toggle_options() {
        let args = SubmitArgs {
            document_id: None,
            document_url: Some("https://example.com/report.pdf".to_string()),
            no_images: true,
            tables: true,
            no_embeddings: true,
            ..args()
        };

        let request = args.to_request();
        assert!(request.document_id.is_none());
        assert_eq!(
            request.document_url.as_deref(),
            Some("https://example.com/report.pdf")
        );
        assert!(!request.options.extract_images);
        assert!(request.options.extract_tables);
        assert!(!request.options.enable_embeddings);
    }
}
