//! Configuration module
//!
//! Handles CLI configuration: where the API lives and how to authenticate.
//! Settings come from the JOBWATCH_* environment variables, with
//! command-line flags taking precedence.

use anyhow::{Context, Result};
use jobwatch_client::{ClientConfig, JobApiClient};
use std::time::Duration;
use tracing::debug;

/// Connection overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Base URL of the document-processing API
    pub api_url: Option<String>,

    /// Path prefix in front of every endpoint
    pub api_prefix: Option<String>,

    /// Bearer token, if the API requires one
    pub api_key: Option<String>,

    /// Timeout of a single HTTP request
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Resolves the client configuration from the process environment
    pub fn client_config(&self) -> Result<ClientConfig> {
        self.client_config_from(|key| std::env::var(key).ok())
    }

    /// Resolves the client configuration from an arbitrary key lookup
    pub fn client_config_from<F>(&self, lookup: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::from_lookup(|key| match key {
            // The flag replaces the variable entirely
            "JOBWATCH_API_URL" if self.api_url.is_some() => self.api_url.clone(),
            _ => lookup(key),
        })
        .context("Invalid API configuration in environment")?;

        if let Some(prefix) = &self.api_prefix {
            config = config.with_api_prefix(prefix);
        }

        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }

        if let Some(timeout) = self.request_timeout {
            config = config.with_request_timeout(timeout);
        }

        config.validate().context("Invalid API configuration")?;
        Ok(config)
    }

    /// Builds an API client from this configuration
    pub fn client(&self) -> Result<JobApiClient> {
        let client =
            JobApiClient::new(self.client_config()?).context("Failed to create API client")?;
        debug!("Using API at {}", client.base_url());
        Ok(client)
    }
}
