//! Monitor configuration
//!
//! Defines the polling cadence, stall detection and ceilings of a
//! monitoring session.

use std::time::Duration;

/// Monitoring session configuration
///
/// All intervals and ceilings are configurable to allow tuning for slow
/// pipelines (large PDFs with image extraction) and flaky networks.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Time between two status polls
    pub poll_interval: Duration,

    /// Repeat observations of the same progress value tolerated before the
    /// job is declared stalled
    pub max_stuck_polls: u32,

    /// Hard ceiling on the number of polls
    pub max_polls: Option<u32>,

    /// Hard ceiling on the wall time of the session
    pub max_duration: Option<Duration>,

    /// Consecutive transient fetch errors tolerated before giving up
    pub max_transport_errors: u32,

    /// Timeout of a single status fetch, independent of `max_duration`
    pub request_timeout: Duration,

    /// Consult checkpoint history when the outcome is not a success
    pub inspect_checkpoints: bool,
}

impl MonitorConfig {
    /// Creates a configuration with the given interval and defaults elsewhere
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Self::default()
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables (all optional):
    /// - JOBWATCH_POLL_INTERVAL (seconds, default: 15)
    /// - JOBWATCH_MAX_STUCK_POLLS (default: 40)
    /// - JOBWATCH_MAX_POLLS (default: unlimited)
    /// - JOBWATCH_TIMEOUT (seconds, default: 600, 0 disables)
    /// - JOBWATCH_MAX_TRANSPORT_ERRORS (default: 3)
    /// - JOBWATCH_REQUEST_TIMEOUT (seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    ///
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_u64 = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let poll_interval = parse_u64("JOBWATCH_POLL_INTERVAL")
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        let max_stuck_polls = parse_u64("JOBWATCH_MAX_STUCK_POLLS")
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(defaults.max_stuck_polls);

        let max_polls = parse_u64("JOBWATCH_MAX_POLLS")
            .and_then(|n| u32::try_from(n).ok())
            .or(defaults.max_polls);

        let max_duration = match parse_u64("JOBWATCH_TIMEOUT") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.max_duration,
        };

        let max_transport_errors = parse_u64("JOBWATCH_MAX_TRANSPORT_ERRORS")
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(defaults.max_transport_errors);

        let request_timeout = parse_u64("JOBWATCH_REQUEST_TIMEOUT")
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let config = Self {
            poll_interval,
            max_stuck_polls,
            max_polls,
            max_duration,
            max_transport_errors,
            request_timeout,
            inspect_checkpoints: defaults.inspect_checkpoints,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_max_stuck_polls(mut self, max_stuck_polls: u32) -> Self {
        self.max_stuck_polls = max_stuck_polls;
        self
    }

    pub fn with_max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Option<Duration>) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_max_transport_errors(mut self, max_transport_errors: u32) -> Self {
        self.max_transport_errors = max_transport_errors;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_checkpoints(mut self, inspect: bool) -> Self {
        self.inspect_checkpoints = inspect;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_stuck_polls == 0 {
            anyhow::bail!("max_stuck_polls must be greater than 0");
        }

        if self.max_polls == Some(0) {
            anyhow::bail!("max_polls must be greater than 0 when set");
        }

        if matches!(self.max_duration, Some(d) if d.is_zero()) {
            anyhow::bail!("max_duration must be greater than 0 when set");
        }

        if self.max_transport_errors == 0 {
            anyhow::bail!("max_transport_errors must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            max_stuck_polls: 40,
            max_polls: None,
            max_duration: Some(Duration::from_secs(600)), // 10 minutes
            max_transport_errors: 3,
            request_timeout: Duration::from_secs(30),
            inspect_checkpoints: true,
        }
    }
}
