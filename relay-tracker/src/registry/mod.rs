//! Job registry
//!
//! Single source of truth for every job this client submitted or tracks.
//! Jobs keep their insertion order. Every mutation is written through to
//! the backing [`JobStore`] before it becomes visible in memory, so the
//! two can only disagree until the next successful write.

mod store;

pub use store::{FileStore, JobStore, MemoryStore, STORAGE_KEY, StoreError};

use relay_core::domain::job::{Job, JobPatch, JobStatus};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job {0} not found")]
    NotFound(String),

    #[error("job {0} is already registered")]
    DuplicateId(String),

    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("failed to persist registry: {0}")]
    Storage(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Ordered, durably-backed collection of jobs keyed by id
pub struct Registry {
    jobs: Mutex<Vec<Job>>,
    store: Arc<dyn JobStore>,
}

impl Registry {
    /// Creates an empty registry; nothing is read from `store`
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            store,
        }
    }

    /// Creates a registry from whatever `store` holds
    ///
    /// Absent, corrupt or unreadable storage yields an empty registry and
    /// a log line instead of an error.
    pub fn hydrate(store: Arc<dyn JobStore>) -> Self {
        let jobs = match store.load() {
            Ok(Some(stored)) => {
                let mut seen = HashSet::new();
                let total = stored.len();
                let jobs: Vec<Job> = stored
                    .into_iter()
                    .filter(|job| seen.insert(job.id.clone()))
                    .collect();
                if jobs.len() != total {
                    warn!(
                        "Dropped {} duplicate job record(s) from storage",
                        total - jobs.len()
                    );
                }
                info!("Restored {} job(s) from storage", jobs.len());
                jobs
            }
            Ok(None) => {
                info!("No stored jobs found, starting with an empty registry");
                Vec::new()
            }
            Err(e) => {
                warn!("Could not read stored jobs, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            jobs: Mutex::new(jobs),
            store,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Job>> {
        self.jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Persists `next` and only then makes it the in-memory state
    fn commit(&self, jobs: &mut MutexGuard<'_, Vec<Job>>, next: Vec<Job>) -> Result<()> {
        self.store.save(&next)?;
        **jobs = next;
        Ok(())
    }

    /// Adds a new job
    ///
    /// # Errors
    /// `DuplicateId` if a job with the same id is already registered.
    pub fn insert(&self, job: Job) -> Result<Job> {
        let mut jobs = self.lock();

        if jobs.iter().any(|j| j.id == job.id) {
            return Err(RegistryError::DuplicateId(job.id));
        }

        let mut next = jobs.clone();
        next.push(job.clone());
        self.commit(&mut jobs, next)?;

        debug!("Registered {} job {}", job.kind, job.id);
        Ok(job)
    }

    /// Merges `patch` into the job with `id` and returns the updated job
    ///
    /// Re-applying a patch that changes nothing is accepted without a
    /// write, which makes repeated terminal updates idempotent.
    ///
    /// # Errors
    /// `NotFound` for unknown ids, `InvalidTransition` if the patch would
    /// move the status backwards or out of a terminal state.
    pub fn update(&self, id: &str, patch: &JobPatch) -> Result<Job> {
        let mut jobs = self.lock();

        let index = jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let current = &jobs[index];
        if let Some(to) = patch.status {
            if !current.status.can_transition_to(to) {
                return Err(RegistryError::InvalidTransition {
                    id: id.to_string(),
                    from: current.status,
                    to,
                });
            }
        }

        let updated = current.merged(patch);
        if updated == *current {
            return Ok(updated);
        }

        let mut next = jobs.clone();
        next[index] = updated.clone();
        self.commit(&mut jobs, next)?;

        debug!("Job {} is now {}", id, updated.status);
        Ok(updated)
    }

    /// Returns the job with `id`
    pub fn get(&self, id: &str) -> Result<Job> {
        self.lock()
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// All jobs in insertion order
    pub fn list(&self) -> Vec<Job> {
        self.lock().clone()
    }

    /// Jobs that have not reached a terminal state, in insertion order
    pub fn pending(&self) -> Vec<Job> {
        self.lock()
            .iter()
            .filter(|j| !j.is_terminal())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
