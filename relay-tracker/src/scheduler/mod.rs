//! Scheduler layer for the tracker
//!
//! Owns one poll task per tracked job and turns control-plane replies
//! into registry updates until every job reaches a terminal state.

pub mod poller;

pub use poller::{PollOutcome, StatusPoller};
