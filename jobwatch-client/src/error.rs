//! Error types for the jobwatch client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the job API
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Network failure before a response was received
    #[error("transport error: {0}")]
    Transport(String),

    /// The request exceeded its own timeout
    #[error("request timed out")]
    Timeout,

    /// API returned a non-success status code
    #[error("API rejected the request (status {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error body returned by the API
        message: String,
    },

    /// Unknown job id
    #[error("job not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Client could not be built from its configuration
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Create a rejection from status code and message
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::Rejected { status: 404, .. })
    }

    /// Whether the failure is likely to clear up on its own
    ///
    /// Network errors, timeouts and 5xx responses are transient; a remote
    /// restart typically surfaces as a short burst of gateway errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Decode(_) | Self::InvalidConfig(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidConfig(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Transport("connection reset".into()).is_transient());
        assert!(ClientError::Timeout.is_transient());
        assert!(ClientError::rejected(503, "unavailable").is_transient());
        assert!(!ClientError::rejected(400, "bad request").is_transient());
        assert!(!ClientError::NotFound("job-1".into()).is_transient());
        assert!(!ClientError::Decode("missing field".into()).is_transient());
    }

    #[test]
    fn test_not_found_detection() {
        assert!(ClientError::NotFound("job-1".into()).is_not_found());
        assert!(ClientError::rejected(404, "gone").is_not_found());
        assert!(!ClientError::rejected(500, "boom").is_not_found());
    }
}
