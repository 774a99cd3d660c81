//! Status poller
//!
//! Polls one job on a fixed interval and turns the point-in-time snapshots
//! into a monitored stream with stall, timeout and transport-failure
//! detection. Each poller owns its state; concurrent sessions share nothing.

use jobwatch_client::{ClientError, JobClient};
use jobwatch_core::domain::job::{JobId, JobStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;

/// Progress value below any valid percentage
const NO_PROGRESS: i16 = -1;

/// Observation emitted on every tick
#[derive(Debug, Clone)]
pub enum PollEvent {
    Snapshot {
        poll: u32,
        status: JobStatus,
        /// Consecutive repeat observations of the current progress value
        stuck_count: u32,
    },
    TransportError {
        poll: u32,
        consecutive: u32,
        error: ClientError,
    },
}

/// Why polling stopped
#[derive(Debug, Clone)]
pub enum PollEnd {
    /// The job reached `Completed`, `Failed` or `Interrupted`
    Terminal { status: JobStatus, polls: u32 },
    /// Progress stopped moving for longer than allowed
    Stalled {
        status: JobStatus,
        elapsed_without_progress: Duration,
        polls: u32,
    },
    /// The poll-count or wall-time ceiling was reached
    TimedOut {
        last_status: Option<JobStatus>,
        polls: u32,
    },
    /// Too many consecutive transient fetch errors
    TransportExhausted {
        error: ClientError,
        last_status: Option<JobStatus>,
        polls: u32,
    },
    /// The caller cancelled between two ticks
    Cancelled {
        last_status: Option<JobStatus>,
        polls: u32,
    },
}

impl PollEnd {
    pub fn polls(&self) -> u32 {
        match self {
            Self::Terminal { polls, .. }
            | Self::Stalled { polls, .. }
            | Self::TimedOut { polls, .. }
            | Self::TransportExhausted { polls, .. }
            | Self::Cancelled { polls, .. } => *polls,
        }
    }
}

/// Poller for a single job
pub struct Poller {
    client: Arc<dyn JobClient>,
    job_id: JobId,
    config: MonitorConfig,
    last_progress: i16,
    stuck_count: u32,
    consecutive_errors: u32,
    polls: u32,
    last_status: Option<JobStatus>,
    started_at: Instant,
    last_change_at: Instant,
}

impl Poller {
    /// Creates a poller; the session clock starts now
    pub fn new(client: Arc<dyn JobClient>, job_id: JobId, config: MonitorConfig) -> Self {
        let now = Instant::now();
        Self {
            client,
            job_id,
            config,
            last_progress: NO_PROGRESS,
            stuck_count: 0,
            consecutive_errors: 0,
            polls: 0,
            last_status: None,
            started_at: now,
            last_change_at: now,
        }
    }

    /// Polls until a stop condition or cancellation
    ///
    /// Cancellation is only observed between ticks; an in-flight request is
    /// always allowed to finish. Non-transient client errors (unknown job,
    /// rejected request, undecodable body) abort immediately.
    pub async fn run<F>(
        mut self,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> Result<PollEnd, ClientError>
    where
        F: FnMut(&PollEvent) + Send,
    {
        info!(
            "Polling job {} (interval: {:?}, max stuck polls: {})",
            self.job_id, self.config.poll_interval, self.config.max_stuck_polls
        );

        loop {
            if cancel.is_cancelled() {
                return Ok(self.cancelled());
            }

            if let Some(end) = self.tick(&mut on_event).await? {
                info!("Stopped polling job {} after {} poll(s)", self.job_id, self.polls);
                return Ok(end);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Ok(self.cancelled()),
                _ = time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// Performs a single poll and applies the stop rules
    ///
    /// Within one tick a terminal state wins over the ceiling, and the
    /// ceiling wins over a stall.
    async fn tick<F>(&mut self, on_event: &mut F) -> Result<Option<PollEnd>, ClientError>
    where
        F: FnMut(&PollEvent) + Send,
    {
        self.polls += 1;
        let poll = self.polls;

        let fetched = match time::timeout(
            self.config.request_timeout,
            self.client.fetch_status(&self.job_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        };

        match fetched {
            Ok(status) => {
                self.consecutive_errors = 0;
                self.observe_progress(status.progress);

                debug!(
                    "Poll {} of job {}: {} {}% (stuck {})",
                    poll, self.job_id, status.state, status.progress, self.stuck_count
                );

                on_event(&PollEvent::Snapshot {
                    poll,
                    status: status.clone(),
                    stuck_count: self.stuck_count,
                });
                self.last_status = Some(status.clone());

                if status.is_terminal() {
                    return Ok(Some(PollEnd::Terminal {
                        status,
                        polls: poll,
                    }));
                }

                if self.ceiling_reached() {
                    return Ok(Some(self.timed_out()));
                }

                // A value seen for the first time never counts as a stall
                if self.stuck_count > 0 && self.stuck_count >= self.config.max_stuck_polls {
                    warn!(
                        "Job {} stalled at {}% for {} poll(s)",
                        self.job_id, status.progress, self.stuck_count
                    );
                    return Ok(Some(PollEnd::Stalled {
                        status,
                        elapsed_without_progress: self.last_change_at.elapsed(),
                        polls: poll,
                    }));
                }

                Ok(None)
            }
            Err(error) if error.is_transient() => {
                self.consecutive_errors += 1;
                warn!(
                    "Poll {} of job {} failed ({}/{}): {}",
                    poll,
                    self.job_id,
                    self.consecutive_errors,
                    self.config.max_transport_errors,
                    error
                );

                on_event(&PollEvent::TransportError {
                    poll,
                    consecutive: self.consecutive_errors,
                    error: error.clone(),
                });

                if self.consecutive_errors >= self.config.max_transport_errors {
                    return Ok(Some(PollEnd::TransportExhausted {
                        error,
                        last_status: self.last_status.clone(),
                        polls: poll,
                    }));
                }

                if self.ceiling_reached() {
                    return Ok(Some(self.timed_out()));
                }

                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn observe_progress(&mut self, progress: u8) {
        let progress = i16::from(progress);
        if progress == self.last_progress {
            self.stuck_count += 1;
        } else {
            self.stuck_count = 0;
            self.last_progress = progress;
            self.last_change_at = Instant::now();
        }
    }

    fn ceiling_reached(&self) -> bool {
        let polls_exceeded = matches!(self.config.max_polls, Some(max) if self.polls >= max);
        let duration_exceeded =
            matches!(self.config.max_duration, Some(max) if self.started_at.elapsed() >= max);
        polls_exceeded || duration_exceeded
    }

    fn timed_out(&self) -> PollEnd {
        warn!(
            "Job {} reached its monitoring ceiling after {} poll(s)",
            self.job_id, self.polls
        );
        PollEnd::TimedOut {
            last_status: self.last_status.clone(),
            polls: self.polls,
        }
    }

    fn cancelled(&self) -> PollEnd {
        info!("Polling of job {} cancelled after {} poll(s)", self.job_id, self.polls);
        PollEnd::Cancelled {
            last_status: self.last_status.clone(),
            polls: self.polls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedClient, Step, completed_with, status, transport_error};
    use jobwatch_core::domain::job::JobState;
    use serde_json::json;

    fn config() -> MonitorConfig {
        MonitorConfig::new(Duration::from_secs(15))
            .with_max_stuck_polls(5)
            .with_max_duration(None)
    }

    async fn run_script(
        steps: Vec<Step>,
        config: MonitorConfig,
    ) -> (Result<PollEnd, ClientError>, Arc<ScriptedClient>, Vec<PollEvent>) {
        let client = Arc::new(ScriptedClient::new(steps));
        let poller = Poller::new(client.clone(), JobId::from("job-1"), config);
        let mut events = Vec::new();
        let end = poller
            .run(&CancellationToken::new(), |event| events.push(event.clone()))
            .await;
        (end, client, events)
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_completion() {
        let (end, client, events) = run_script(
            vec![
                status(JobState::Queued, 0),
                status(JobState::Processing, 10),
                status(JobState::Processing, 45),
                completed_with(json!({"chunks": 12})),
            ],
            config(),
        )
        .await;

        match end.unwrap() {
            PollEnd::Terminal { status, polls } => {
                assert_eq!(status.state, JobState::Completed);
                assert_eq!(polls, 4);
            }
            other => panic!("unexpected end: {:?}", other),
        }
        assert_eq!(client.calls(), 4);
        assert_eq!(events.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalls_after_repeated_progress() {
        let started = Instant::now();
        let (end, client, _) =
            run_script(vec![status(JobState::Processing, 30)], config()).await;

        match end.unwrap() {
            PollEnd::Stalled {
                status,
                elapsed_without_progress,
                polls,
            } => {
                assert_eq!(polls, 6);
                assert_eq!(status.progress, 30);
                // First seen on poll 1, stalled on poll 6: five intervals
                assert_eq!(elapsed_without_progress, Duration::from_secs(75));
            }
            other => panic!("unexpected end: {:?}", other),
        }
        assert_eq!(client.calls(), 6);
        assert_eq!(started.elapsed(), Duration::from_secs(75));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_change_resets_stuck_count() {
        let mut steps = vec![status(JobState::Queued, 0); 4];
        steps.extend(vec![status(JobState::Processing, 20); 4]);
        steps.push(completed_with(json!({})));

        let (end, _, events) = run_script(steps, config()).await;

        assert!(matches!(end.unwrap(), PollEnd::Terminal { polls: 9, .. }));
        let stuck: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                PollEvent::Snapshot { stuck_count, .. } => Some(*stuck_count),
                _ => None,
            })
            .collect();
        assert_eq!(stuck, vec![0, 1, 2, 3, 0, 1, 2, 3, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_startup_not_flagged_early() {
        let mut steps = vec![status(JobState::Queued, 0); 5];
        steps.push(status(JobState::Processing, 5));
        steps.push(completed_with(json!({})));

        let (end, _, _) = run_script(steps, config()).await;
        assert!(matches!(end.unwrap(), PollEnd::Terminal { polls: 7, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_stall_threshold_never_trips_on_moving_progress() {
        let (end, client, _) = run_script(
            vec![
                status(JobState::Processing, 10),
                status(JobState::Processing, 20),
                completed_with(json!({})),
            ],
            config().with_max_stuck_polls(0),
        )
        .await;

        assert!(matches!(end.unwrap(), PollEnd::Terminal { polls: 3, .. }));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_is_terminal_on_first_poll() {
        let (end, client, _) = run_script(vec![status(JobState::Interrupted, 40)], config()).await;

        assert!(matches!(end.unwrap(), PollEnd::Terminal { polls: 1, .. }));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_escalate() {
        let (end, client, events) = run_script(vec![transport_error()], config()).await;

        match end.unwrap() {
            PollEnd::TransportExhausted {
                error,
                last_status,
                polls,
            } => {
                assert!(matches!(error, ClientError::Transport(_)));
                assert!(last_status.is_none());
                assert_eq!(polls, 3);
            }
            other => panic!("unexpected end: {:?}", other),
        }
        assert_eq!(client.calls(), 3);
        assert!(
            events
                .iter()
                .all(|e| matches!(e, PollEvent::TransportError { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_counter_resets_on_success() {
        let (end, _, _) = run_script(
            vec![
                transport_error(),
                transport_error(),
                status(JobState::Processing, 10),
                transport_error(),
                transport_error(),
                completed_with(json!({"chunks": 1})),
            ],
            config(),
        )
        .await;

        assert!(matches!(end.unwrap(), PollEnd::Terminal { polls: 6, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_aborts() {
        let (end, client, _) = run_script(
            vec![Step::Error(ClientError::NotFound("job-1".to_string()))],
            config(),
        )
        .await;

        assert!(matches!(end, Err(ClientError::NotFound(_))));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_ceiling() {
        let mut steps = Vec::new();
        for progress in 1..=10 {
            steps.push(status(JobState::Processing, progress));
        }

        let (end, client, _) =
            run_script(steps, config().with_max_polls(Some(4))).await;

        match end.unwrap() {
            PollEnd::TimedOut { last_status, polls } => {
                assert_eq!(polls, 4);
                assert_eq!(last_status.unwrap().progress, 4);
            }
            other => panic!("unexpected end: {:?}", other),
        }
        assert_eq!(client.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_ceiling_wins_over_stall_in_same_tick() {
        // Poll 6 happens at t=75s: the stall and a 75s ceiling trip together
        let config = config().with_max_duration(Some(Duration::from_secs(75)));
        let (end, _, _) = run_script(vec![status(JobState::Processing, 30)], config).await;

        assert!(matches!(end.unwrap(), PollEnd::TimedOut { polls: 6, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_wins_over_ceiling() {
        let config = config().with_max_polls(Some(2));
        let (end, _, _) = run_script(
            vec![status(JobState::Processing, 50), completed_with(json!({}))],
            config,
        )
        .await;

        assert!(matches!(end.unwrap(), PollEnd::Terminal { polls: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_times_out_individually() {
        let config = config().with_request_timeout(Duration::from_secs(5));
        let (end, _, events) = run_script(
            vec![
                Step::Slow(Duration::from_secs(60), JobStatus::new("job-1", JobState::Processing, 5)),
                completed_with(json!({})),
            ],
            config,
        )
        .await;

        assert!(matches!(
            events[0],
            PollEvent::TransportError {
                poll: 1,
                error: ClientError::Timeout,
                ..
            }
        ));
        assert!(matches!(end.unwrap(), PollEnd::Terminal { polls: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_between_ticks() {
        let client = Arc::new(ScriptedClient::new(vec![status(JobState::Processing, 10)]));
        let poller = Poller::new(client.clone(), JobId::from("job-1"), config());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(20)).await;
            trigger.cancel();
        });

        let end = poller.run(&cancel, |_| {}).await.unwrap();

        match end {
            PollEnd::Cancelled { last_status, polls } => {
                // Polls at t=0 and t=15, cancelled during the sleep before t=30
                assert_eq!(polls, 2);
                assert_eq!(last_status.unwrap().progress, 10);
            }
            other => panic!("unexpected end: {:?}", other),
        }
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_poll() {
        let client = Arc::new(ScriptedClient::new(vec![status(JobState::Processing, 10)]));
        let poller = Poller::new(client.clone(), JobId::from("job-1"), config());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let end = poller.run(&cancel, |_| {}).await.unwrap();
        assert!(matches!(end, PollEnd::Cancelled { polls: 0, .. }));
        assert_eq!(client.calls(), 0);
    }
}
