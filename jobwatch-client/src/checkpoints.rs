//! Checkpoint-related API endpoints

use async_trait::async_trait;
use jobwatch_core::domain::checkpoint::Checkpoint;
use jobwatch_core::domain::job::JobId;
use jobwatch_core::dto::checkpoint::CheckpointListResponse;
use tracing::debug;

use crate::JobApiClient;
use crate::error::{ClientError, Result};

/// Read-only access to a job's persisted checkpoints
#[async_trait]
pub trait CheckpointSource: Send + Sync {
    /// Fetches every checkpoint of a job in the order the server stores them
    async fn fetch_checkpoints(&self, id: &JobId) -> Result<Vec<Checkpoint>>;
}

#[async_trait]
impl CheckpointSource for JobApiClient {
    async fn fetch_checkpoints(&self, id: &JobId) -> Result<Vec<Checkpoint>> {
        let url = self.job_url(id, &["checkpoints"])?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let listing: CheckpointListResponse =
            self.handle_response(response).await.map_err(|e| match e {
                ClientError::NotFound(_) => ClientError::NotFound(id.to_string()),
                other => other,
            })?;

        let checkpoints = listing.into_checkpoints(id);
        debug!("Fetched {} checkpoint(s) for job {}", checkpoints.len(), id);

        Ok(checkpoints)
    }
}
