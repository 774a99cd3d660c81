//! Jobwatch Core
//!
//! Core types shared by the jobwatch client, monitor and CLI.
//!
//! This crate contains:
//! - Domain types: jobs, status snapshots, checkpoints and monitoring outcomes
//! - DTOs: wire shapes of the remote document-processing job API

pub mod domain;
pub mod dto;
