//! Durable job storage
//!
//! The registry writes its whole contents after every mutation and reads
//! them back once at startup. Snapshots are JSON with RFC 3339 timestamps.

use chrono::{DateTime, Utc};
use relay_core::domain::job::Job;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Fixed namespace the registry snapshot is stored under
pub const STORAGE_KEY: &str = "render-jobs";

const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised by a job store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot could not be encoded or decoded: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// Durable backing for the job registry
pub trait JobStore: Send + Sync {
    /// Reads the stored jobs; `Ok(None)` when nothing was ever saved
    fn load(&self) -> Result<Option<Vec<Job>>, StoreError>;

    /// Replaces the stored jobs with `jobs`
    fn save(&self, jobs: &[Job]) -> Result<(), StoreError>;
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    key: &'a str,
    saved_at: DateTime<Utc>,
    jobs: &'a [Job],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    jobs: Vec<Job>,
}

/// JSON file store, one file per storage key
///
/// Writes go to a sibling temporary file that is then renamed over the
/// snapshot, so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store rooted at `data_dir`, using the fixed storage key
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{}.json", STORAGE_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl JobStore for FileStore {
    fn load(&self) -> Result<Option<Vec<Job>>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion(snapshot.version));
        }

        Ok(Some(snapshot.jobs))
    }

    fn save(&self, jobs: &[Job]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }

        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            key: STORAGE_KEY,
            saved_at: Utc::now(),
            jobs,
        };
        let encoded = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, encoded).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        Ok(())
    }
}

/// In-memory store for ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: Mutex<Option<Vec<Job>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<Job>>, StoreError> {
        Ok(self
            .jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, jobs: &[Job]) -> Result<(), StoreError> {
        *self
            .jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(jobs.to_vec());
        Ok(())
    }
}
