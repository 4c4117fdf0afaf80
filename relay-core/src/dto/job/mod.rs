//! Job DTOs for control-plane communication

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::job::{JobKind, JobResult, JobStatus};
use crate::error::ValidationError;

/// Request to submit a job, one variant per kind
///
/// Each variant carries only the fields its kind understands, so the
/// submission path validates by matching instead of probing optionals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JobRequest {
    SpeechSynthesis(SpeechSynthesis),
    SpeechTranscription(SpeechTranscription),
    PortraitAnimation(PortraitAnimation),
    ImageAnalysis(ImageAnalysis),
}

/// Text-to-speech, optionally conditioned on a reference voice clip
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeechSynthesis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechTranscription {
    pub audio_url: String,
}

/// Talking-head animation of a portrait driven by an audio track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortraitAnimation {
    pub image_url: String,
    pub audio_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl JobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            JobRequest::SpeechSynthesis(_) => JobKind::SpeechSynthesis,
            JobRequest::SpeechTranscription(_) => JobKind::SpeechTranscription,
            JobRequest::PortraitAnimation(_) => JobKind::PortraitAnimation,
            JobRequest::ImageAnalysis(_) => JobKind::ImageAnalysis,
        }
    }

    /// Checks that every field the kind requires is present and non-blank
    pub fn validate(&self) -> Result<(), ValidationError> {
        let kind = self.kind();
        match self {
            JobRequest::SpeechSynthesis(req) => {
                if is_blank(req.text.as_deref()) && is_blank(req.audio_url.as_deref()) {
                    return Err(ValidationError::MissingField {
                        kind,
                        field: "text",
                    });
                }
                if let Some(url) = req.audio_url.as_deref().filter(|u| !u.trim().is_empty()) {
                    check_url("audio_url", url)?;
                }
            }
            JobRequest::SpeechTranscription(req) => {
                require(kind, "audio_url", &req.audio_url)?;
            }
            JobRequest::PortraitAnimation(req) => {
                require(kind, "image_url", &req.image_url)?;
                require(kind, "audio_url", &req.audio_url)?;
            }
            JobRequest::ImageAnalysis(req) => {
                require(kind, "image_url", &req.image_url)?;
            }
        }
        Ok(())
    }

    /// Builds the JSON submission body: the kind's fields plus the common options
    pub fn to_body(&self, options: &SubmitOptions) -> serde_json::Result<Value> {
        let mut body = match self {
            JobRequest::SpeechSynthesis(req) => serde_json::to_value(req)?,
            JobRequest::SpeechTranscription(req) => serde_json::to_value(req)?,
            JobRequest::PortraitAnimation(req) => serde_json::to_value(req)?,
            JobRequest::ImageAnalysis(req) => serde_json::to_value(req)?,
        };

        if let (Value::Object(fields), Value::Object(extra)) =
            (&mut body, serde_json::to_value(options)?)
        {
            fields.extend(extra);
        }

        Ok(body)
    }
}

/// Fields common to every submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// URL the control plane calls back when the job finishes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,

    /// Maximum total wait before the client gives up on the job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait_seconds: Option<u64>,

    /// Estimated completion time; a hint only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_seconds: Option<u64>,
}

impl SubmitOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.callback_url {
            check_url("callback_url", url)?;
        }
        if self.max_wait_seconds == Some(0) {
            return Err(ValidationError::InvalidField {
                field: "max_wait_seconds",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Control-plane reply to a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedJob {
    pub id: String,
    #[serde(default = "queued")]
    pub status: JobStatus,
}

/// Reply to `GET /status/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    /// Upstream failure description, usually only set on `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply to `GET /result/{id}`
pub type ResultResponse = JobResult;

fn queued() -> JobStatus {
    JobStatus::Queued
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn require(kind: JobKind, field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { kind, field });
    }
    check_url(field, value)
}

fn check_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidField {
            field,
            reason: format!("expected an http(s) URL, got '{}'", value),
        })
    }
}
