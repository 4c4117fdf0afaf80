//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error text recorded when a job fails without an upstream description
pub const GENERIC_FAILURE: &str = "Job failed";

/// A unit of generative work tracked by the client
///
/// Created when the control plane accepts a submission; owned by the
/// registry afterwards. `id` and `kind` never change once inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Client-side polling ceiling chosen at submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait_seconds: Option<u64>,
}

impl Job {
    /// A freshly submitted job in the `queued` state
    pub fn queued(id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            id: id.into(),
            kind,
            status: JobStatus::Queued,
            result: None,
            error: None,
            created_at: Utc::now(),
            max_wait_seconds: None,
        }
    }

    pub fn with_max_wait(mut self, seconds: u64) -> Self {
        self.max_wait_seconds = Some(seconds);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns a copy of this job with `patch` merged in
    ///
    /// The merge keeps `result` only on succeeded jobs and `error` only on
    /// failed jobs; a failed job always ends up with a non-empty error.
    /// Transition legality is checked by the caller via
    /// [`JobStatus::can_transition_to`].
    pub fn merged(&self, patch: &JobPatch) -> Job {
        let mut job = self.clone();

        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(result) = &patch.result {
            job.result = Some(result.clone());
        }
        if let Some(error) = &patch.error {
            job.error = Some(error.clone());
        }

        match job.status {
            JobStatus::Queued | JobStatus::Running => {
                job.result = None;
                job.error = None;
            }
            JobStatus::Succeeded => job.error = None,
            JobStatus::Failed => {
                job.result = None;
                if job.error.as_deref().is_none_or(|e| e.trim().is_empty()) {
                    job.error = Some(GENERIC_FAILURE.to_string());
                }
            }
        }

        job
    }
}

/// The four kinds of generative work the control plane accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    SpeechSynthesis,
    SpeechTranscription,
    PortraitAnimation,
    ImageAnalysis,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::SpeechSynthesis => "speech-synthesis",
            JobKind::SpeechTranscription => "speech-transcription",
            JobKind::PortraitAnimation => "portrait-animation",
            JobKind::ImageAnalysis => "image-analysis",
        }
    }

    /// Control-plane path that accepts submissions of this kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            JobKind::SpeechSynthesis => "/csm",
            JobKind::SpeechTranscription => "/whisper",
            JobKind::PortraitAnimation => "/portrait",
            JobKind::ImageAnalysis => "/analyze",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job lifecycle status
///
/// `queued → running → {succeeded | failed}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Running => 1,
            JobStatus::Succeeded | JobStatus::Failed => 2,
        }
    }

    /// Whether a job currently in `self` may be moved to `next`
    ///
    /// Staying put is always allowed. Terminal states never change and
    /// non-terminal states only move forward.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if *self == next {
            return true;
        }
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Artifacts produced by a succeeded job
///
/// Absent fields mean the job kind does not produce that artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Partial update applied to a registered job
///
/// Carries no `id` or `kind`, so an update can never alter either.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub result: Option<JobResult>,
    pub error: Option<String>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn succeeded(result: JobResult) -> Self {
        Self {
            status: Some(JobStatus::Succeeded),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            result: None,
            error: Some(error.into()),
        }
    }
}
