//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque job identifier assigned by the remote API at submission time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Remote job state
///
/// `Completed`, `Failed` and `Interrupted` are terminal. `Interrupted` means
/// the job was stopped by an external restart rather than by its own logic,
/// so it may be resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[serde(alias = "pending")]
    Queued,
    #[serde(alias = "running")]
    Processing,
    Completed,
    #[serde(alias = "error")]
    Failed,
    Interrupted,
}

impl JobState {
    /// Whether no further transition can occur from this state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Interrupted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time snapshot of a remote job
///
/// A fresh value is produced on every poll and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: JobId,
    pub state: JobState,
    /// Percentage in `0..=100`
    pub progress: u8,
    pub error_message: Option<String>,
    pub result_summary: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub observed_at: DateTime<Utc>,
}

impl JobStatus {
    /// Creates a snapshot observed now; progress above 100 is clamped
    pub fn new(id: impl Into<JobId>, state: JobState, progress: u8) -> Self {
        Self {
            id: id.into(),
            state,
            progress: progress.min(100),
            error_message: None,
            result_summary: None,
            metadata: Map::new(),
            observed_at: Utc::now(),
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_result(mut self, summary: Map<String, Value>) -> Self {
        self.result_summary = Some(summary);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
