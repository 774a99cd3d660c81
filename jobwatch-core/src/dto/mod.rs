//! Data Transfer Objects for the remote job API
//!
//! Wire representations of requests and responses. They are converted into
//! domain types at the client boundary so the rest of the workspace never
//! sees raw API payloads.

pub mod checkpoint;
pub mod job;
