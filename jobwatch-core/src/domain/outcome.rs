//! Monitoring outcome types

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

use crate::domain::job::JobStatus;

/// Why a monitoring session ended in `Outcome::Failure`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    /// The job reported `failed`
    Failed,
    /// The job was stopped by an external restart and may be resubmitted
    Interrupted,
    /// The status endpoint stayed unreachable
    Transport,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Interrupted => "interrupted",
            Self::Transport => "transport",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal value of one monitoring session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        result_summary: Map<String, Value>,
    },
    Failure {
        reason: FailureReason,
        /// Verbatim error reported by the job or the transport
        error_message: Option<String>,
        last_status: Option<JobStatus>,
    },
    Stalled {
        last_status: JobStatus,
        #[serde(serialize_with = "duration_secs")]
        elapsed_without_progress: Duration,
    },
    TimedOut {
        last_status: Option<JobStatus>,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Short lowercase tag, matching the serialized `outcome` field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
            Self::Stalled { .. } => "stalled",
            Self::TimedOut { .. } => "timed_out",
        }
    }

    /// Last status snapshot observed before the outcome was decided
    pub fn last_status(&self) -> Option<&JobStatus> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { last_status, .. } | Self::TimedOut { last_status } => {
                last_status.as_ref()
            }
            Self::Stalled { last_status, .. } => Some(last_status),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failure { error_message, .. } => error_message.as_deref(),
            _ => self
                .last_status()
                .and_then(|status| status.error_message.as_deref()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { result_summary } => {
                write!(f, "success")?;
                if !result_summary.is_empty() {
                    write!(f, " {}", Value::Object(result_summary.clone()))?;
                }
                Ok(())
            }
            Self::Failure {
                reason,
                error_message,
                ..
            } => {
                write!(f, "failure ({})", reason)?;
                if let Some(message) = error_message {
                    write!(f, ": {}", message)?;
                }
                Ok(())
            }
            Self::Stalled {
                last_status,
                elapsed_without_progress,
            } => write!(
                f,
                "stalled at {}% ({}) for {:.1}s",
                last_status.progress,
                last_status.state,
                elapsed_without_progress.as_secs_f64()
            ),
            Self::TimedOut { last_status } => match last_status {
                Some(status) => write!(f, "timed out at {}% ({})", status.progress, status.state),
                None => write!(f, "timed out before any status was observed"),
            },
        }
    }
}

/// Serializes a duration as fractional seconds
pub fn duration_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
