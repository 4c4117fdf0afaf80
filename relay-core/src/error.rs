//! Validation errors for job submissions

use thiserror::Error;

use crate::domain::job::JobKind;

/// A submission was rejected before any network call was made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A field the job kind cannot run without is absent or blank
    #[error("{kind} job requires `{field}`")]
    MissingField { kind: JobKind, field: &'static str },

    /// A field is present but unusable
    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}
