//! Human-readable progress narrative of a monitoring session

use jobwatch_core::domain::job::JobState;

use crate::scheduler::PollEvent;

/// Accumulates one line per poll event
#[derive(Debug, Default)]
pub struct Narrative {
    lines: Vec<String>,
    last_state: Option<JobState>,
    last_progress: Option<u8>,
}

impl Narrative {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describes a poll event, stores the line and returns it
    pub fn record(&mut self, event: &PollEvent) -> &str {
        let line = match event {
            PollEvent::Snapshot {
                poll,
                status,
                stuck_count,
            } => {
                let state = match self.last_state {
                    Some(previous) if previous != status.state => {
                        format!("{} -> {}", previous, status.state)
                    }
                    _ => status.state.to_string(),
                };

                let change = match (self.last_progress, *stuck_count) {
                    (_, n) if n > 0 => format!(
                        "no change for {} poll{}",
                        n,
                        if n == 1 { "" } else { "s" }
                    ),
                    (Some(previous), _) => {
                        format!("{:+}", i16::from(status.progress) - i16::from(previous))
                    }
                    (None, _) => "first report".to_string(),
                };

                self.last_state = Some(status.state);
                self.last_progress = Some(status.progress);

                let mut line = format!("poll {}: {} {}% ({})", poll, state, status.progress, change);
                if let Some(error) = &status.error_message {
                    line.push_str(&format!(" error: {}", error));
                }
                line
            }
            PollEvent::TransportError {
                poll,
                consecutive,
                error,
            } => format!(
                "poll {}: status unavailable ({} in a row): {}",
                poll, consecutive, error
            ),
        };

        self.push(line)
    }

    /// Appends a free-form line
    pub fn push(&mut self, line: impl Into<String>) -> &str {
        self.lines.push(line.into());
        self.lines.last().map(String::as_str).unwrap_or_default()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwatch_client::ClientError;
    use jobwatch_core::domain::job::JobStatus;

    fn snapshot(poll: u32, state: JobState, progress: u8, stuck_count: u32) -> PollEvent {
        PollEvent::Snapshot {
            poll,
            status: JobStatus::new("job-1", state, progress),
            stuck_count,
        }
    }

    #[test]
    fn test_describes_progress_and_state_changes() {
        let mut narrative = Narrative::new();

        assert_eq!(
            narrative.record(&snapshot(1, JobState::Queued, 0, 0)),
            "poll 1: queued 0% (first report)"
        );
        assert_eq!(
            narrative.record(&snapshot(2, JobState::Processing, 10, 0)),
            "poll 2: queued -> processing 10% (+10)"
        );
        assert_eq!(
            narrative.record(&snapshot(3, JobState::Processing, 10, 1)),
            "poll 3: processing 10% (no change for 1 poll)"
        );
        assert_eq!(
            narrative.record(&snapshot(4, JobState::Processing, 10, 2)),
            "poll 4: processing 10% (no change for 2 polls)"
        );
        assert_eq!(narrative.into_lines().len(), 4);
    }

    #[test]
    fn test_describes_transport_errors_and_job_errors() {
        let mut narrative = Narrative::new();

        let line = narrative.record(&PollEvent::TransportError {
            poll: 1,
            consecutive: 1,
            error: ClientError::Timeout,
        });
        assert_eq!(line, "poll 1: status unavailable (1 in a row): request timed out");

        let failed = PollEvent::Snapshot {
            poll: 2,
            status: JobStatus::new("job-1", JobState::Failed, 35).with_error("OCR model unavailable"),
            stuck_count: 0,
        };
        assert_eq!(
            narrative.record(&failed),
            "poll 2: failed 35% (first report) error: OCR model unavailable"
        );

        narrative.push("done");
        assert_eq!(narrative.into_lines().last().unwrap(), "done");
    }
}
