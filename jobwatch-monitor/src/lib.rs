//! Jobwatch Monitor
//!
//! Watches long-running document-processing jobs on a remote API and
//! decides how each monitoring session ends.
//!
//! Architecture:
//! - Configuration: polling cadence, stall threshold and ceilings
//! - Scheduler: the per-job polling loop with stall and timeout detection
//! - Services: outcome classification, checkpoint history and narrative
//!
//! A session polls until the job completes, fails, is interrupted, stalls
//! or exceeds its ceiling, and then reports exactly one outcome. Sessions
//! are independent; many jobs can be monitored concurrently from one
//! [`JobMonitor`].

pub mod config;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::MonitorConfig;
pub use scheduler::{PollEnd, PollEvent, Poller};
pub use service::{
    CheckpointError, CheckpointReader, ClearResult, JobHistory, JobMonitor, MonitorError,
    MonitorReport, MonitorResult, Narrative,
};
