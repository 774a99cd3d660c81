//! Client configuration
//!
//! Connection settings are passed explicitly into the client constructor so
//! several independently configured clients can live in one process.

use std::time::Duration;

/// Connection configuration for [`crate::JobApiClient`]
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://localhost:8000")
    pub base_url: String,

    /// Path prefix in front of every endpoint
    pub api_prefix: String,

    /// Bearer token sent with every request
    pub api_key: Option<String>,

    /// Timeout for a single request, including reading the body
    pub request_timeout: Duration,

    /// Timeout for establishing the TCP/TLS connection
    pub connect_timeout: Duration,

    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but the URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_prefix: "/api/v1".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("jobwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables (all optional):
    /// - JOBWATCH_API_URL (default: http://localhost:8000)
    /// - JOBWATCH_API_PREFIX (default: /api/v1)
    /// - JOBWATCH_API_KEY
    /// - JOBWATCH_REQUEST_TIMEOUT (seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("JOBWATCH_API_URL") {
            Some(url) => Self::new(url),
            None => Self::default(),
        };

        if let Some(prefix) = lookup("JOBWATCH_API_PREFIX") {
            config = config.with_api_prefix(prefix);
        }

        if let Some(key) = lookup("JOBWATCH_API_KEY") {
            config = config.with_api_key(key);
        }

        if let Some(secs) = lookup("JOBWATCH_REQUEST_TIMEOUT").and_then(|s| s.trim().parse().ok()) {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        self.api_prefix = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.connect_timeout.is_zero() {
            anyhow::bail!("connect_timeout must be greater than 0");
        }

        if matches!(&self.api_key, Some(key) if key.trim().is_empty()) {
            anyhow::bail!("api_key cannot be blank");
        }

        Ok(())
    }

    /// Full URL of the jobs collection
    pub(crate) fn jobs_url(&self) -> String {
        format!("{}{}/jobs", self.base_url, self.api_prefix)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}

// The key must never end up in logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_prefix", &self.api_prefix)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
