//! Data Transfer Objects for the job control plane
//!
//! Request and response bodies exchanged with the control-plane API,
//! kept apart from the domain records the tracker persists.

pub mod job;
