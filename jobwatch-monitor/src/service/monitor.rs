//! Job monitor
//!
//! Composes the poller and the checkpoint reader into a single monitoring
//! session that ends in exactly one [`Outcome`]:
//! - `Completed` becomes `Success`
//! - `Failed` and `Interrupted` become `Failure` with a distinguishing reason
//! - poller-level stalls and ceilings keep their own variants
//! - exhausted transport retries become `Failure` with reason `transport`
//!
//! The monitor never retries or resubmits a job; that decision is left to
//! the caller.

use chrono::{DateTime, Utc};
use jobwatch_client::{ClientError, JobClient};
use jobwatch_core::domain::checkpoint::Checkpoint;
use jobwatch_core::domain::job::{JobId, JobState, JobStatus};
use jobwatch_core::domain::outcome::{FailureReason, Outcome, duration_secs};
use jobwatch_core::dto::job::SubmitJobRequest;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::scheduler::{PollEnd, Poller};
use crate::service::checkpoint_reader::{CheckpointError, CheckpointReader};
use crate::service::narrative::Narrative;

/// Conditions that end a session without an outcome
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid monitor configuration: {0}")]
    Config(String),

    /// Unknown job, rejected request or undecodable response
    #[error("job {job_id}: {source}")]
    Client {
        job_id: JobId,
        #[source]
        source: ClientError,
    },

    #[error("failed to submit job: {0}")]
    Submit(#[source] ClientError),
}

/// Result of a monitoring session
#[derive(Debug, Clone)]
pub enum MonitorResult {
    Finished(MonitorReport),
    /// Cancelled by the caller; no outcome was decided
    Cancelled {
        job_id: JobId,
        polls: u32,
        last_status: Option<JobStatus>,
    },
}

/// Final report of a session that reached an outcome
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub job_id: JobId,
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub outcome: Outcome,
    pub polls: u32,
    #[serde(serialize_with = "duration_secs")]
    pub elapsed: Duration,
    /// Stage of the most recent checkpoint, when checkpoints were consulted
    pub last_stage: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub latest_by_stage: BTreeMap<String, Checkpoint>,
    pub narrative: Vec<String>,
}

impl MonitorReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for MonitorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "job {}: {} after {} poll(s) in {:.1}s",
            self.job_id,
            self.outcome,
            self.polls,
            self.elapsed.as_secs_f64()
        )?;

        if let Some(stage) = &self.last_stage {
            write!(f, ", last stage: {}", stage)?;
        }

        // Failure already prints its own message
        if !matches!(self.outcome, Outcome::Failure { .. }) {
            if let Some(error) = self.outcome.error_message() {
                write!(f, ", last error: {}", error)?;
            }
        }

        Ok(())
    }
}

/// Outcome of [`JobMonitor::clear_interrupted`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearResult {
    Deleted,
    AlreadyAbsent,
    /// The job is not interrupted and was left untouched
    NotInterrupted(JobState),
}

/// Orchestrates monitoring sessions
///
/// Cheap to clone; concurrent sessions for different jobs share only the
/// immutable client and configuration.
#[derive(Clone)]
pub struct JobMonitor {
    client: Arc<dyn JobClient>,
    checkpoints: Option<CheckpointReader>,
    config: MonitorConfig,
}

impl JobMonitor {
    pub fn new(client: Arc<dyn JobClient>, config: MonitorConfig) -> Result<Self, MonitorError> {
        config
            .validate()
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        Ok(Self {
            client,
            checkpoints: None,
            config,
        })
    }

    /// Enables checkpoint diagnostics for non-success outcomes
    pub fn with_checkpoints(mut self, reader: CheckpointReader) -> Self {
        self.checkpoints = Some(reader);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Monitors a job until it reaches an outcome or `cancel` fires
    pub async fn monitor(
        &self,
        job_id: &JobId,
        cancel: &CancellationToken,
    ) -> Result<MonitorResult, MonitorError> {
        self.monitor_with(job_id, cancel, |_| {}).await
    }

    /// Like [`JobMonitor::monitor`], streaming narrative lines to `on_line`
    pub async fn monitor_with<F>(
        &self,
        job_id: &JobId,
        cancel: &CancellationToken,
        mut on_line: F,
    ) -> Result<MonitorResult, MonitorError>
    where
        F: FnMut(&str) + Send,
    {
        let session_id = Uuid::new_v4();
        let span = info_span!("monitor", job_id = %job_id, session_id = %session_id);

        async move {
            info!("Monitoring session started");

            let started_at = Utc::now();
            let clock = Instant::now();
            let mut narrative = Narrative::new();

            let poller = Poller::new(Arc::clone(&self.client), job_id.clone(), self.config.clone());
            let end = poller
                .run(cancel, |event| on_line(narrative.record(event)))
                .await
                .map_err(|source| MonitorError::Client {
                    job_id: job_id.clone(),
                    source,
                })?;

            let polls = end.polls();
            let outcome = match end {
                PollEnd::Cancelled { last_status, polls } => {
                    on_line(narrative.push(format!("cancelled after {} poll(s)", polls)));
                    info!("Monitoring session cancelled");
                    return Ok(MonitorResult::Cancelled {
                        job_id: job_id.clone(),
                        polls,
                        last_status,
                    });
                }
                PollEnd::Terminal { status, .. } => classify_terminal(status),
                PollEnd::Stalled {
                    status,
                    elapsed_without_progress,
                    ..
                } => Outcome::Stalled {
                    last_status: status,
                    elapsed_without_progress,
                },
                PollEnd::TimedOut { last_status, .. } => Outcome::TimedOut { last_status },
                PollEnd::TransportExhausted {
                    error, last_status, ..
                } => Outcome::Failure {
                    reason: FailureReason::Transport,
                    error_message: Some(error.to_string()),
                    last_status,
                },
            };

            let mut last_stage = None;
            let mut latest_by_stage = BTreeMap::new();

            if !outcome.is_success() && self.config.inspect_checkpoints {
                if let Some(reader) = &self.checkpoints {
                    let fetched =
                        match time::timeout(self.config.request_timeout, reader.history(job_id))
                            .await
                        {
                            Ok(result) => result,
                            Err(_) => Err(CheckpointError::Fetch(ClientError::Timeout)),
                        };

                    match fetched {
                        Ok(history) => {
                            last_stage = history.latest().map(|c| c.stage.clone());
                            latest_by_stage = history.latest_by_stage();
                            if let Some(stage) = &last_stage {
                                on_line(narrative.push(format!("last checkpoint stage: {}", stage)));
                            }
                        }
                        Err(e) => {
                            warn!("Checkpoint diagnostics unavailable: {}", e);
                            on_line(narrative.push(format!("checkpoints unavailable: {}", e)));
                        }
                    }
                }
            }

            on_line(narrative.push(format!("outcome: {}", outcome)));
            info!("Monitoring session finished: {}", outcome.kind());

            Ok(MonitorResult::Finished(MonitorReport {
                job_id: job_id.clone(),
                session_id,
                started_at,
                outcome,
                polls,
                elapsed: clock.elapsed(),
                last_stage,
                latest_by_stage,
                narrative: narrative.into_lines(),
            }))
        }
        .instrument(span)
        .await
    }

    /// Submits a document and monitors the resulting job
    pub async fn submit_and_monitor<F>(
        &self,
        request: &SubmitJobRequest,
        cancel: &CancellationToken,
        mut on_line: F,
    ) -> Result<MonitorResult, MonitorError>
    where
        F: FnMut(&str) + Send,
    {
        let submitted = self
            .client
            .submit(request)
            .await
            .map_err(MonitorError::Submit)?;

        info!("Submitted job {}", submitted.job_id);
        on_line(&format!("submitted job {}", submitted.job_id));

        self.monitor_with(&submitted.job_id, cancel, on_line).await
    }

    /// Deletes a job record, but only if the job is stuck in `Interrupted`
    ///
    /// This is an administrative action separate from monitoring.
    pub async fn clear_interrupted(&self, job_id: &JobId) -> Result<ClearResult, MonitorError> {
        let to_error = |source| MonitorError::Client {
            job_id: job_id.clone(),
            source,
        };

        match self.client.fetch_status(job_id).await {
            Ok(status) if status.state == JobState::Interrupted => {
                self.client.delete_job(job_id).await.map_err(to_error)?;
                info!("Cleared interrupted job {}", job_id);
                Ok(ClearResult::Deleted)
            }
            Ok(status) => {
                warn!(
                    "Refusing to clear job {} in state {}",
                    job_id, status.state
                );
                Ok(ClearResult::NotInterrupted(status.state))
            }
            Err(e) if e.is_not_found() => Ok(ClearResult::AlreadyAbsent),
            Err(e) => Err(to_error(e)),
        }
    }
}

/// Maps a terminal snapshot to its outcome
///
/// Only called with snapshots the poller reported as terminal.
fn classify_terminal(status: JobStatus) -> Outcome {
    match status.state {
        JobState::Completed => Outcome::Success {
            result_summary: status.result_summary.unwrap_or_default(),
        },
        JobState::Interrupted => Outcome::Failure {
            reason: FailureReason::Interrupted,
            error_message: status.error_message.clone(),
            last_status: Some(status),
        },
        JobState::Failed => Outcome::Failure {
            reason: FailureReason::Failed,
            error_message: status.error_message.clone(),
            last_status: Some(status),
        },
        // The poller never ends on these
        JobState::Queued | JobState::Processing => {
            debug_assert!(
                status.is_terminal(),
                "polling ended on non-terminal state {}",
                status.state
            );
            warn!("Polling ended on non-terminal state {}", status.state);
            Outcome::TimedOut {
                last_status: Some(status),
            }
        }
    }
}
