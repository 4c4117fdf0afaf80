//! Job-related API endpoints

use relay_core::domain::job::JobStatus;
use relay_core::dto::job::{JobRequest, ResultResponse, StatusResponse, SubmitOptions, SubmittedJob};
use reqwest::Method;

use crate::JobClient;
use crate::error::Result;

impl JobClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a job
    ///
    /// The request and options are validated before anything is sent. The
    /// returned job is always `queued`; recording it is up to the caller.
    ///
    /// # Arguments
    /// * `request` - The kind-specific payload
    /// * `options` - Callback URL, wait ceiling and completion estimate
    ///
    /// # Returns
    /// The upstream-assigned job id
    pub async fn submit(&self, request: &JobRequest, options: &SubmitOptions) -> Result<SubmittedJob> {
        request.validate()?;
        options.validate()?;

        let kind = request.kind();
        let body = request
            .to_body(options)
            .map_err(|e| crate::ClientError::InvalidRequest(e.to_string()))?;

        let endpoint = kind.endpoint().trim_start_matches('/');
        let response = self
            .request(Method::POST, &[endpoint])?
            .json(&body)
            .send()
            .await?;

        let submitted: SubmittedJob = self.handle_response(response).await?;
        if submitted.status != JobStatus::Queued {
            tracing::debug!(
                "Control plane reported {} for new job {}, recording as queued",
                submitted.status,
                submitted.id
            );
        }

        tracing::info!("Submitted {} job {}", kind, submitted.id);

        Ok(SubmittedJob {
            id: submitted.id,
            status: JobStatus::Queued,
        })
    }

    /// Get the current status of a job
    ///
    /// # Arguments
    /// * `job_id` - The upstream job id
    pub async fn job_status(&self, job_id: &str) -> Result<StatusResponse> {
        let response = self
            .request(Method::GET, &["status", job_id])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the artifacts of a finished job
    ///
    /// # Arguments
    /// * `job_id` - The upstream job id
    ///
    /// # Returns
    /// Result URL and/or extracted text; absent fields were not produced
    pub async fn job_result(&self, job_id: &str) -> Result<ResultResponse> {
        let response = self
            .request(Method::GET, &["result", job_id])?
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use relay_core::dto::job::{PortraitAnimation, SpeechTranscription};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(String, Option<String>, Option<String>, Value)>>>;

    /// Serves a fake control plane and records what it receives
    async fn spawn_control_plane() -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();

        let app = Router::new()
            .route(
                "/whisper",
                post(move |headers: HeaderMap, Json(body): Json<Value>| {
                    let record = record.clone();
                    async move {
                        let header = |name: &str| {
                            headers
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string)
                        };
                        record.lock().unwrap().push((
                            "/whisper".to_string(),
                            header("x-c3-render-key"),
                            header("authorization"),
                            body,
                        ));
                        Json(json!({ "id": "j1", "status": "queued" }))
                    }
                }),
            )
            .route(
                "/status/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "missing" {
                        return Err(StatusCode::NOT_FOUND);
                    }
                    Ok(Json(json!({ "status": "running" })))
                }),
            )
            .route(
                "/result/{id}",
                get(|| async { Json(json!({ "text": "hello world" })) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), seen)
    }

    #[tokio::test]
    async fn test_submit_sends_both_credential_headers() {
        let (base, seen) = spawn_control_plane().await;
        let client = JobClient::new(base).with_api_key("k-1").unwrap();

        let job = client
            .submit(
                &JobRequest::SpeechTranscription(SpeechTranscription {
                    audio_url: "https://x/a.mp3".to_string(),
                }),
                &SubmitOptions {
                    max_wait_seconds: Some(30),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(job.id, "j1");
        assert_eq!(job.status, JobStatus::Queued);

        let seen = seen.lock().unwrap();
        let (path, key, auth, body) = &seen[0];
        assert_eq!(path, "/whisper");
        assert_eq!(key.as_deref(), Some("k-1"));
        assert_eq!(auth.as_deref(), Some("Bearer k-1"));
        assert_eq!(body["audio_url"], "https://x/a.mp3");
        assert_eq!(body["max_wait_seconds"], 30);
    }

    #[tokio::test]
    async fn test_invalid_submission_never_hits_network() {
        let (base, seen) = spawn_control_plane().await;
        let client = JobClient::new(base);

        let err = client
            .submit(
                &JobRequest::PortraitAnimation(PortraitAnimation {
                    image_url: "https://x/face.png".to_string(),
                    audio_url: String::new(),
                }),
                &SubmitOptions::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_and_result_queries() {
        let (base, _) = spawn_control_plane().await;
        let client = JobClient::new(base);

        let status = client.job_status("j1").await.unwrap();
        assert_eq!(status.status, JobStatus::Running);

        let result = client.job_result("j1").await.unwrap();
        assert_eq!(result.text.as_deref(), Some("hello world"));
        assert!(result.result_url.is_none());
    }

    #[tokio::test]
    async fn test_status_error_carries_http_status() {
        let (base, _) = spawn_control_plane().await;
        let client = JobClient::new(base);

        let err = client.job_status("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
