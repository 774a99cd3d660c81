//! Jobwatch HTTP Client
//!
//! A small, type-safe client for the remote document-processing job API.
//!
//! The client performs exactly one request per call and never retries;
//! retry and stall policy belong to the monitor. Both the monitor and the
//! CLI talk to the API through the [`JobClient`] and [`CheckpointSource`]
//! traits so they can be exercised against in-memory fakes.
//!
//! # Example
//!
//! ```no_run
//! use jobwatch_client::{ClientConfig, JobApiClient, JobClient};
//! use jobwatch_core::domain::job::JobId;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = JobApiClient::new(ClientConfig::new("http://localhost:8000"))?;
//!
//!     let status = client.fetch_status(&JobId::from("job-42")).await?;
//!     println!("{} is {} ({}%)", status.id, status.state, status.progress);
//!     Ok(())
//! }
//! ```

mod checkpoints;
pub mod config;
pub mod error;
mod jobs;

// Re-export commonly used types
pub use checkpoints::CheckpointSource;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use jobs::JobClient;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

/// HTTP client for the document-processing job API
///
/// Holds only connection configuration; every call is a single request.
#[derive(Debug, Clone)]
pub struct JobApiClient {
    config: ClientConfig,
    /// HTTP client instance
    client: Client,
}

impl JobApiClient {
    /// Create a new client from an explicit configuration
    ///
    /// The API key, if any, is installed as a sensitive default
    /// `Authorization` header, and both timeouts are applied to every request.
    ///
    /// # Example
    /// ```
    /// use jobwatch_client::{ClientConfig, JobApiClient};
    ///
    /// let client = JobApiClient::new(ClientConfig::new("http://localhost:8000")).unwrap();
    /// assert_eq!(client.base_url(), "http://localhost:8000");
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| ClientError::InvalidConfig(format!("invalid api key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-success statuses become `NotFound` (404) or `Rejected`. The body
    /// is read fully before decoding so that a dropped connection stays a
    /// transport error rather than a decode error.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        let body = response.bytes().await?;

        serde_json::from_slice(&body)
            .map_err(|e| ClientError::Decode(format!("Failed to parse JSON response: {}", e)))
    }

    /// Turn a non-success response into the matching error
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == reqwest::StatusCode::NOT_FOUND {
            let detail = if error_text.is_empty() { url } else { error_text };
            return Err(ClientError::NotFound(detail));
        }

        Err(ClientError::rejected(status.as_u16(), error_text))
    }
}
