//! Job tracker
//!
//! Ties the job client, the registry and the status poller together:
//! a successful submission is recorded as `queued` and watched until it
//! finishes. Jobs left unfinished by an earlier process can be resumed.

use anyhow::{Context, Result};
use relay_client::JobClient;
use relay_core::domain::job::Job;
use relay_core::dto::job::{JobRequest, SubmitOptions};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::registry::{FileStore, JobStore, Registry};
use crate::repository::HttpStatusRepository;
use crate::scheduler::{PollOutcome, StatusPoller};

/// Client-side view of every job this process submitted or tracks
pub struct JobTracker {
    client: JobClient,
    registry: Arc<Registry>,
    poller: StatusPoller,
    default_max_wait: u64,
}

impl JobTracker {
    /// Opens the tracker, restoring the registry from `config.data_dir`
    pub fn open(config: &Config) -> Result<Self> {
        let store = FileStore::new(&config.data_dir);
        info!("Using job registry at {}", store.path().display());
        Self::with_store(config, Arc::new(store))
    }

    /// Opens the tracker on an explicit store
    pub fn with_store(config: &Config, store: Arc<dyn JobStore>) -> Result<Self> {
        config.validate()?;

        let client = JobClient::new(config.api_url.clone());
        client
            .set_api_key(config.api_key.as_deref().filter(|k| !k.trim().is_empty()))
            .context("Failed to install render key")?;

        let registry = Arc::new(Registry::hydrate(store));
        let repository = Arc::new(HttpStatusRepository::new(client.clone()));
        let poller = StatusPoller::new(
            Arc::clone(&registry),
            repository,
            config.poll_interval,
            config.max_wait,
        );

        Ok(Self {
            client,
            registry,
            poller,
            default_max_wait: config.max_wait.as_secs(),
        })
    }

    pub fn client(&self) -> &JobClient {
        &self.client
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    /// Submits a job, records it as `queued` and starts watching it
    pub async fn submit(&self, request: &JobRequest, options: &SubmitOptions) -> Result<Job> {
        let submitted = self
            .client
            .submit(request, options)
            .await
            .with_context(|| format!("Failed to submit {} job", request.kind()))?;

        let max_wait = options.max_wait_seconds.unwrap_or(self.default_max_wait);
        let job = self
            .registry
            .insert(Job::queued(submitted.id, request.kind()).with_max_wait(max_wait))
            .context("Failed to record submitted job")?;

        self.poller.watch(&job.id)?;
        Ok(job)
    }

    /// Resumes watching every unfinished job from an earlier session
    pub fn resume(&self) -> usize {
        self.poller.resume_pending()
    }

    /// Starts watching one registered job again
    pub fn watch(&self, job_id: &str) -> Result<bool> {
        Ok(self.poller.watch(job_id)?)
    }

    /// Waits for `job_id` to finish and returns its final record
    pub async fn wait(&self, job_id: &str) -> Result<(Job, Option<PollOutcome>)> {
        let outcome = self.poller.wait(job_id).await;
        let job = self.registry.get(job_id)?;
        Ok((job, outcome))
    }

    /// Waits for every watched job to finish
    pub async fn wait_all(&self) -> Vec<(String, PollOutcome)> {
        self.poller.wait_all().await
    }

    /// Stops watching `job_id`; its recorded status is left as is
    pub fn abandon(&self, job_id: &str) -> bool {
        self.poller.cancel(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryStore;
    use axum::{
        Json, Router,
        http::HeaderMap,
        routing::{get, post},
    };
    use relay_core::domain::job::{JobKind, JobStatus};
    use relay_core::dto::job::SpeechTranscription;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Control plane that reports `running` once, then `succeeded`
    async fn spawn_control_plane() -> String {
        let polls = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route(
                "/whisper",
                post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                    assert_eq!(headers["x-c3-render-key"], "k-1");
                    assert_eq!(body["audio_url"], "https://x/a.mp3");
                    Json(json!({ "id": "j1", "status": "queued" }))
                }),
            )
            .route(
                "/status/{id}",
                get(move || {
                    let polls = polls.clone();
                    async move {
                        let status = if polls.fetch_add(1, Ordering::SeqCst) == 0 {
                            "running"
                        } else {
                            "succeeded"
                        };
                        Json(json!({ "status": status }))
                    }
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

        format!("http://{}", addr)
    }

    fn config(api_url: String) -> Config {
        let mut config = Config::new(api_url).with_api_key("k-1");
        config.poll_interval = Duration::from_millis(20);
        config.max_wait = Duration::from_secs(10);
        config
    }

    fn transcription() -> JobRequest {
        JobRequest::SpeechTranscription(SpeechTranscription {
            audio_url: "https://x/a.mp3".to_string(),
        })
    }

    #[tokio::test]
    async fn test_submit_records_queued_job_then_tracks_it_to_completion() {
        let base = spawn_control_plane().await;
        let tracker =
            JobTracker::with_store(&config(base), Arc::new(MemoryStore::new())).unwrap();

        let job = tracker
            .submit(&transcription(), &SubmitOptions::default())
            .await
            .unwrap();
        assert_eq!(job.id, "j1");
        assert_eq!(job.kind, JobKind::SpeechTranscription);
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.result.is_none() && job.error.is_none());
        assert_eq!(job.max_wait_seconds, Some(10));

        let (done, outcome) = tracker.wait("j1").await.unwrap();
        assert_eq!(outcome, Some(PollOutcome::Succeeded));
        assert_eq!(done.status, JobStatus::Succeeded);
        assert_eq!(done.result.unwrap().text.as_deref(), Some("hello world"));
        assert!(done.error.is_none());
    }

    #[tokio::test]
    async fn test_rejected_submission_records_nothing() {
        let base = spawn_control_plane().await;
        let tracker =
            JobTracker::with_store(&config(base), Arc::new(MemoryStore::new())).unwrap();

        let invalid = JobRequest::SpeechTranscription(SpeechTranscription {
            audio_url: String::new(),
        });
        assert!(
            tracker
                .submit(&invalid, &SubmitOptions::default())
                .await
                .is_err()
        );
        assert!(tracker.registry().is_empty());
    }

    #[tokio::test]
    async fn test_restart_resumes_unfinished_jobs() {
        let base = spawn_control_plane().await;
        let dir = tempfile::tempdir().unwrap();
        let config = config(base).with_data_dir(dir.path());

        {
            let first = JobTracker::open(&config).unwrap();
            first
                .registry()
                .insert(Job::queued("j1", JobKind::SpeechTranscription))
                .unwrap();
        }

        let second = JobTracker::open(&config).unwrap();
        assert_eq!(second.registry().pending().len(), 1);
        assert_eq!(second.resume(), 1);

        let outcomes = second.wait_all().await;
        assert_eq!(outcomes, vec![("j1".to_string(), PollOutcome::Succeeded)]);
        assert!(second.registry().pending().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config::new("ftp://nowhere".to_string());
        assert!(JobTracker::with_store(&config, Arc::new(MemoryStore::new())).is_err());
    }
}
