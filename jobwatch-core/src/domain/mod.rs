//! Core domain types
//!
//! These types describe a remotely executed processing job as seen by the
//! client. They are produced by the client crate from API responses and
//! consumed read-only by the monitor.

pub mod checkpoint;
pub mod job;
pub mod outcome;
