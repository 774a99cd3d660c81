//! Job-related API endpoints
//!
//! - Submitting documents for processing
//! - Fetching a job's current status
//! - Deleting job records

use async_trait::async_trait;
use chrono::Utc;
use jobwatch_core::domain::job::{JobId, JobStatus};
use jobwatch_core::dto::job::{JobStatusResponse, SubmitJobRequest, SubmitJobResponse};
use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::JobApiClient;
use crate::error::{ClientError, Result};

/// Operations on remote processing jobs
///
/// Implementations perform a single request per call and never retry.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Submits a document for processing
    ///
    /// Fails with `Rejected` on any non-success status.
    async fn submit(&self, request: &SubmitJobRequest) -> Result<SubmitJobResponse>;

    /// Fetches a fresh status snapshot
    ///
    /// Fails with `NotFound` if the id is unknown.
    async fn fetch_status(&self, id: &JobId) -> Result<JobStatus>;

    /// Deletes a job record
    ///
    /// Idempotent: deleting an unknown or already deleted job succeeds.
    async fn delete_job(&self, id: &JobId) -> Result<()>;
}

impl JobApiClient {
    /// URL of a single job, optionally followed by extra path segments
    ///
    /// The id is percent-encoded as one path segment.
    pub(crate) fn job_url(&self, id: &JobId, tail: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.jobs_url())
            .map_err(|e| ClientError::InvalidConfig(format!("invalid base url: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidConfig("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(id.as_str())
            .extend(tail);

        Ok(url)
    }
}

#[async_trait]
impl JobClient for JobApiClient {
    async fn submit(&self, request: &SubmitJobRequest) -> Result<SubmitJobResponse> {
        let url = self.config.jobs_url();
        debug!("POST {}", url);

        let response = self.client.post(&url).json(request).send().await?;

        self.handle_response(response).await.map_err(|e| match e {
            ClientError::NotFound(message) => ClientError::rejected(404, message),
            other => other,
        })
    }

    async fn fetch_status(&self, id: &JobId) -> Result<JobStatus> {
        let url = self.job_url(id, &[])?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let body: JobStatusResponse = self.handle_response(response).await.map_err(|e| match e {
            ClientError::NotFound(_) => ClientError::NotFound(id.to_string()),
            other => other,
        })?;

        Ok(body.into_status(id.clone(), Utc::now()))
    }

    async fn delete_job(&self, id: &JobId) -> Result<()> {
        let url = self.job_url(id, &[])?;
        debug!("DELETE {}", url);

        let response = self.client.delete(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                debug!("Job {} already absent", id);
                Ok(())
            }
            _ => Self::check_status(response).await.map(|_| ()),
        }
    }
}
