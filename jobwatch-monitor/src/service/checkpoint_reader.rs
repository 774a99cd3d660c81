//! Checkpoint reader
//!
//! Reconstructs a job's execution history from its persisted checkpoints.
//! Every call re-fetches from the source; nothing is cached and remote state
//! is never modified.

use jobwatch_client::{CheckpointSource, ClientError};
use jobwatch_core::domain::checkpoint::{Checkpoint, CheckpointHistory, HistoryError};
use jobwatch_core::domain::job::{JobId, JobState, JobStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Metadata key some pipeline versions use to report the active stage
const CURRENT_STAGE_KEY: &str = "current_stage";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("failed to fetch checkpoints: {0}")]
    Fetch(#[from] ClientError),

    #[error("inconsistent checkpoint history: {0}")]
    History(#[from] HistoryError),
}

/// Execution history of one job: checkpoints combined with its summary
#[derive(Debug, Clone, Serialize)]
pub struct JobHistory {
    pub job_id: JobId,
    pub state: JobState,
    pub progress: u8,
    pub error_message: Option<String>,
    /// Stage the job was last known to occupy, unless it completed
    pub current_stage: Option<String>,
    /// Stage an interrupted job would resume from
    pub resume_stage: Option<String>,
    /// Distinct stages in the order they were first reached
    pub stages: Vec<String>,
    pub latest_by_stage: BTreeMap<String, Checkpoint>,
    pub checkpoints: CheckpointHistory,
}

/// Reader over a job's checkpoint history
#[derive(Clone)]
pub struct CheckpointReader {
    source: Arc<dyn CheckpointSource>,
}

impl CheckpointReader {
    pub fn new(source: Arc<dyn CheckpointSource>) -> Self {
        Self { source }
    }

    /// Fetches and validates the ordered checkpoint history
    ///
    /// The result is always non-decreasing in `created_at`; a listing that
    /// violates the ordering is reported as an error rather than reordered.
    pub async fn history(&self, job_id: &JobId) -> Result<CheckpointHistory, CheckpointError> {
        let records = self.source.fetch_checkpoints(job_id).await?;
        let history = CheckpointHistory::from_records(job_id.clone(), records)?;
        debug!("Job {} has {} checkpoint(s)", job_id, history.len());
        Ok(history)
    }

    /// Most recent checkpoint per stage
    pub async fn latest_by_stage(
        &self,
        job_id: &JobId,
    ) -> Result<BTreeMap<String, Checkpoint>, CheckpointError> {
        Ok(self.history(job_id).await?.latest_by_stage())
    }

    /// Combines the checkpoint history with a status snapshot
    pub async fn reconstruct(&self, status: &JobStatus) -> Result<JobHistory, CheckpointError> {
        let checkpoints = self.history(&status.id).await?;
        Ok(build_history(status, checkpoints))
    }
}

fn build_history(status: &JobStatus, checkpoints: CheckpointHistory) -> JobHistory {
    let last_stage = checkpoints
        .latest()
        .map(|c| c.stage.clone())
        .or_else(|| {
            status
                .metadata
                .get(CURRENT_STAGE_KEY)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });

    let current_stage = match status.state {
        JobState::Completed => None,
        _ => last_stage.clone(),
    };

    let resume_stage = match status.state {
        JobState::Interrupted => last_stage,
        _ => None,
    };

    JobHistory {
        job_id: status.id.clone(),
        state: status.state,
        progress: status.progress,
        error_message: status.error_message.clone(),
        current_stage,
        resume_stage,
        stages: checkpoints.stages().into_iter().map(str::to_string).collect(),
        latest_by_stage: checkpoints.latest_by_stage(),
        checkpoints,
    }
}
