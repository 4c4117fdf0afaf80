//! Core domain types
//!
//! The fundamental records shared between the client, the tracker and the CLI.

pub mod job;
pub mod workload;
