//! Relay job tracker
//!
//! Submits generative jobs to the control plane and observes them until
//! they finish:
//! - Configuration: connection settings and polling cadence
//! - Registry: ordered, durably-backed record of every job
//! - Repositories: HTTP status and result queries
//! - Scheduler: per-job status polling with deadlines and cancellation
//! - Tracker: the facade tying the above together

pub mod config;
pub mod registry;
pub mod repository;
pub mod scheduler;
pub mod tracker;

pub use config::Config;
pub use registry::{Registry, RegistryError};
pub use scheduler::{PollOutcome, StatusPoller};
pub use tracker::JobTracker;
