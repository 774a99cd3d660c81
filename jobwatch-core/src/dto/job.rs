//! Job DTOs for the remote job API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::job::{JobId, JobState, JobStatus};

/// Request to submit a document for processing (`POST /jobs`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    pub options: ProcessingOptions,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl SubmitJobRequest {
    pub fn for_document(document_id: impl Into<String>) -> Self {
        Self {
            document_id: Some(document_id.into()),
            ..Self::default()
        }
    }

    pub fn for_url(document_url: impl Into<String>) -> Self {
        Self {
            document_url: Some(document_url.into()),
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: ProcessingOptions) -> Self {
        self.options = options;
        self
    }
}

/// Processing options forwarded to the remote pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    pub chunk_size: u32,
    pub chunk_overlap: u32,
    pub extract_images: bool,
    pub extract_tables: bool,
    pub enable_embeddings: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            extract_images: true,
            extract_tables: false,
            enable_embeddings: true,
        }
    }
}

/// Response to a job submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: JobId,
    #[serde(default)]
    pub document_id: Option<String>,
}

/// Body of `GET /jobs/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobState,
    /// Reported as an integer or a float depending on the server version
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl JobStatusResponse {
    /// Converts the wire body into a snapshot of `id` observed at `observed_at`
    pub fn into_status(self, id: JobId, observed_at: DateTime<Utc>) -> JobStatus {
        let result_summary = match self.result {
            Some(Value::Object(map)) => Some(map),
            Some(Value::Null) | None => None,
            Some(other) => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            }
        };

        JobStatus {
            id,
            state: self.status,
            progress: normalize_progress(self.progress),
            error_message: self.error,
            result_summary,
            metadata: self.metadata.unwrap_or_default(),
            observed_at,
        }
    }
}

/// Truncates a reported percentage into `0..=100`
fn normalize_progress(progress: Option<f64>) -> u8 {
    match progress {
        Some(p) if p.is_finite() => p.clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_response_conversion() {
        let body: JobStatusResponse = serde_json::from_value(json!({
            "status": "completed",
            "progress": 100,
            "error": null,
            "result": {"chunks": 12, "images": 3},
            "metadata": {"document_id": "doc-1"}
        }))
        .unwrap();

        let status = body.into_status(JobId::from("job-1"), Utc::now());
        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.progress, 100);
        assert_eq!(status.result_summary.unwrap()["chunks"], json!(12));
        assert_eq!(status.metadata["document_id"], json!("doc-1"));
        assert!(status.error_message.is_none());
    }

    #[test]
    fn test_progress_is_truncated_and_clamped() {
        assert_eq!(normalize_progress(Some(45.9)), 45);
        assert_eq!(normalize_progress(Some(-3.0)), 0);
        assert_eq!(normalize_progress(Some(250.0)), 100);
        assert_eq!(normalize_progress(Some(f64::NAN)), 0);
        assert_eq!(normalize_progress(None), 0);
    }

    #[test]
    fn test_minimal_status_body() {
        let body: JobStatusResponse = serde_json::from_value(json!({"status": "queued"})).unwrap();
        let status = body.into_status(JobId::from("job-2"), Utc::now());
        assert_eq!(status.state, JobState::Queued);
        assert_eq!(status.progress, 0);
        assert!(status.result_summary.is_none());
        assert!(status.metadata.is_empty());
    }

    #[test]
    fn test_error_is_preserved_verbatim() {
        let body: JobStatusResponse =
            serde_json::from_value(json!({"status": "failed", "error": ""})).unwrap();
        let status = body.into_status(JobId::from("job-3"), Utc::now());
        assert_eq!(status.error_message.as_deref(), Some(""));

        let body: JobStatusResponse = serde_json::from_value(
            json!({"status": "failed", "error": "  OCR timeout after 300s\n"}),
        )
        .unwrap();
        let status = body.into_status(JobId::from("job-3"), Utc::now());
        assert_eq!(
            status.error_message.as_deref(),
            Some("  OCR timeout after 300s\n")
        );
    }

    #[test]
    fn test_submit_request_skips_absent_fields() {
        let request = SubmitJobRequest::for_document("doc-7");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["document_id"], "doc-7");
        assert!(json.get("document_url").is_none());
        assert!(json.get("metadata").is_none());
        assert_eq!(json["options"]["chunk_size"], 1000);
    }
}
