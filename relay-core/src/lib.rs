//! Relay Core
//!
//! Core types shared by the render relay components.
//!
//! This crate contains:
//! - Domain types: jobs the client tracks and the nodes it can reach
//! - DTOs: request/response shapes of the job control plane
//! - Validation errors raised before anything goes over the wire

pub mod domain;
pub mod dto;
pub mod error;

pub use error::ValidationError;
