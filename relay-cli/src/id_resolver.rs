//! ID resolver module
//!
//! Job ids are long opaque strings; any unambiguous prefix of one is
//! accepted wherever a job id is expected.

use anyhow::{Result, anyhow};
use relay_core::domain::job::Job;

/// Resolve a job ID or prefix against the locally known jobs
///
/// An exact match wins even when it is also a prefix of other ids.
///
/// # Errors
/// Returns an error if no job matches or the prefix is ambiguous
pub fn resolve_job_id(jobs: &[Job], id_or_prefix: &str) -> Result<String> {
    if jobs.iter().any(|j| j.id == id_or_prefix) {
        return Ok(id_or_prefix.to_string());
    }

    let prefix = id_or_prefix.to_lowercase();
    let matches: Vec<_> = jobs
        .iter()
        .filter(|j| j.id.to_lowercase().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => Err(anyhow!("No job found with ID starting with '{}'", id_or_prefix)),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let ids: Vec<&str> = matches.iter().map(|j| j.id.as_str()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                id_or_prefix,
                ids.join(", ")
            ))
        }
    }
}
