//! Checkpoint DTOs for the remote job API

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::checkpoint::Checkpoint;
use crate::domain::job::JobId;

/// One record of `GET /jobs/{id}/checkpoints`
#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointRecord {
    pub stage: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl CheckpointRecord {
    pub fn into_checkpoint(self, job_id: JobId) -> Checkpoint {
        Checkpoint {
            job_id,
            stage: self.stage,
            created_at: self.created_at,
            data: self.data.unwrap_or_default(),
            metadata: self.metadata.unwrap_or_default(),
        }
    }
}

/// The checkpoint listing is either a bare array or wrapped in an object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CheckpointListResponse {
    Bare(Vec<CheckpointRecord>),
    Wrapped { checkpoints: Vec<CheckpointRecord> },
}

impl CheckpointListResponse {
    /// Converts records in server order
    pub fn into_checkpoints(self, job_id: &JobId) -> Vec<Checkpoint> {
        let records = match self {
            Self::Bare(records) => records,
            Self::Wrapped { checkpoints } => checkpoints,
        };

        records
            .into_iter()
            .map(|record| record.into_checkpoint(job_id.clone()))
            .collect()
    }
}
