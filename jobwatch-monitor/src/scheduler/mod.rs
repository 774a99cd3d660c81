//! Scheduler layer for the monitor
//!
//! This layer owns the polling loop of a monitoring session. It turns
//! point-in-time status snapshots into stall, ceiling and transport-failure
//! decisions without interpreting what the terminal state means.

pub mod poller;

pub use poller::{PollEnd, PollEvent, Poller};
