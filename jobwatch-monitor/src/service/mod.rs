//! Service layer
//!
//! Business logic built on top of the scheduler: outcome classification,
//! checkpoint diagnostics and the human-readable session narrative.

pub mod checkpoint_reader;
pub mod monitor;
pub mod narrative;

pub use checkpoint_reader::{CheckpointError, CheckpointReader, JobHistory};
pub use monitor::{ClearResult, JobMonitor, MonitorError, MonitorReport, MonitorResult};
pub use narrative::Narrative;
