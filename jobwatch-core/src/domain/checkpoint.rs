//! Checkpoint domain types
//!
//! A checkpoint is a durable marker written by the remote pipeline when it
//! reaches a named stage. Checkpoints for one job form an append-only,
//! time-ordered sequence; a later checkpoint for the same stage supersedes an
//! earlier one for display but both stay in the history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::job::JobId;

/// A single persisted pipeline checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub job_id: JobId,
    /// Pipeline phase name, e.g. "chunking" or "image_extraction"
    pub stage: String,
    pub created_at: DateTime<Utc>,
    /// Stage-specific progress facts
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Free-form diagnostic context
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Checkpoint {
    pub fn new(job_id: impl Into<JobId>, stage: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.into(),
            stage: stage.into(),
            created_at,
            data: Map::new(),
            metadata: Map::new(),
        }
    }
}

/// Violations of the checkpoint ordering invariants
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error(
        "checkpoint {index} ({stage}) created at {created_at} precedes the previous checkpoint at {previous}"
    )]
    OutOfOrder {
        index: usize,
        stage: String,
        created_at: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("checkpoint {index} belongs to job {found}, expected {expected}")]
    ForeignJob {
        index: usize,
        expected: JobId,
        found: JobId,
    },
}

/// Validated, ordered checkpoint history of one job
///
/// Every entry is non-decreasing in `created_at` relative to the one before
/// it and belongs to `job_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointHistory {
    job_id: JobId,
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointHistory {
    pub fn new(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            checkpoints: Vec::new(),
        }
    }

    /// Builds a history from records in the order the server returned them
    pub fn from_records(
        job_id: impl Into<JobId>,
        records: impl IntoIterator<Item = Checkpoint>,
    ) -> Result<Self, HistoryError> {
        let mut history = Self::new(job_id);
        for checkpoint in records {
            history.append(checkpoint)?;
        }
        Ok(history)
    }

    /// Appends a checkpoint, refusing anything older than the current tail
    pub fn append(&mut self, checkpoint: Checkpoint) -> Result<(), HistoryError> {
        let index = self.checkpoints.len();

        if checkpoint.job_id != self.job_id {
            return Err(HistoryError::ForeignJob {
                index,
                expected: self.job_id.clone(),
                found: checkpoint.job_id,
            });
        }

        if let Some(last) = self.checkpoints.last() {
            if checkpoint.created_at < last.created_at {
                return Err(HistoryError::OutOfOrder {
                    index,
                    stage: checkpoint.stage,
                    created_at: checkpoint.created_at,
                    previous: last.created_at,
                });
            }
        }

        self.checkpoints.push(checkpoint);
        Ok(())
    }

    pub fn latest(&self) -> Option<&Checkpoint> {
        self.checkpoints.last()
    }

    /// Most recent checkpoint for every stage seen so far
    pub fn latest_by_stage(&self) -> BTreeMap<String, Checkpoint> {
        let mut latest = BTreeMap::new();
        for checkpoint in &self.checkpoints {
            latest.insert(checkpoint.stage.clone(), checkpoint.clone());
        }
        latest
    }

    /// Distinct stage names in the order they first appeared
    pub fn stages(&self) -> Vec<&str> {
        let mut stages: Vec<&str> = Vec::new();
        for checkpoint in &self.checkpoints {
            if !stages.contains(&checkpoint.stage.as_str()) {
                stages.push(&checkpoint.stage);
            }
        }
        stages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}
