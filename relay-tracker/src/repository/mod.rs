//! Repository layer
//!
//! Repositories are stateless clients that abstract communication with
//! the control plane. They are trait-based so the poller can be driven
//! by scripted sources in tests.

mod status;

pub use status::{HttpStatusRepository, StatusRepository};
