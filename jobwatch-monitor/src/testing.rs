//! In-memory fakes of the job API used by the monitor's unit tests

use async_trait::async_trait;
use jobwatch_client::{CheckpointSource, ClientError, JobClient, Result};
use jobwatch_core::domain::checkpoint::Checkpoint;
use jobwatch_core::domain::job::{JobId, JobState, JobStatus};
use jobwatch_core::dto::job::{SubmitJobRequest, SubmitJobResponse};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// One scripted response of `fetch_status`
#[derive(Debug, Clone)]
pub enum Step {
    Status(JobStatus),
    Error(ClientError),
    /// Responds only after the given (virtual) delay
    Slow(Duration, JobStatus),
}

pub fn status(state: JobState, progress: u8) -> Step {
    Step::Status(JobStatus::new("job-1", state, progress))
}

pub fn completed_with(summary: Value) -> Step {
    let summary: Map<String, Value> = match summary {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Step::Status(JobStatus::new("job-1", JobState::Completed, 100).with_result(summary))
}

pub fn transport_error() -> Step {
    Step::Error(ClientError::Transport("connection refused".to_string()))
}

/// Job client replaying a fixed script; the last step repeats forever
pub struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: AtomicU32,
    deleted: Mutex<Vec<JobId>>,
    submitted: Mutex<Vec<SubmitJobRequest>>,
}

impl ScriptedClient {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            calls: AtomicU32::new(0),
            deleted: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<JobId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<SubmitJobRequest> {
        self.submitted.lock().unwrap().clone()
    }

    fn next_step(&self) -> Step {
        let next = self.steps.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(step) => {
                *last = Some(step.clone());
                step
            }
            None => last
                .clone()
                .unwrap_or_else(|| Step::Error(ClientError::NotFound("job-1".to_string()))),
        }
    }
}

#[async_trait]
impl JobClient for ScriptedClient {
    async fn submit(&self, request: &SubmitJobRequest) -> Result<SubmitJobResponse> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(SubmitJobResponse {
            job_id: JobId::from("job-1"),
            document_id: request.document_id.clone(),
        })
    }

    async fn fetch_status(&self, id: &JobId) -> Result<JobStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Status(status) => Ok(JobStatus { id: id.clone(), ..status }),
            Step::Error(err) => Err(err),
            Step::Slow(delay, status) => {
                tokio::time::sleep(delay).await;
                Ok(JobStatus { id: id.clone(), ..status })
            }
        }
    }

    async fn delete_job(&self, id: &JobId) -> Result<()> {
        self.deleted.lock().unwrap().push(id.clone());
        Ok(())
    }
}

/// Checkpoint source returning a fixed listing
pub struct FixedCheckpoints {
    listing: std::result::Result<Vec<Checkpoint>, ClientError>,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl FixedCheckpoints {
    pub fn new(checkpoints: Vec<Checkpoint>) -> Self {
        Self {
            listing: Ok(checkpoints),
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing(error: ClientError) -> Self {
        Self {
            listing: Err(error),
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Answers only after the given (virtual) delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckpointSource for FixedCheckpoints {
    async fn fetch_checkpoints(&self, _id: &JobId) -> Result<Vec<Checkpoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.listing.clone()
    }
}
