//! Status repository
//!
//! Handles communication with the control plane for job observation:
//! - Querying a job's current status
//! - Fetching the artifacts of a succeeded job

use anyhow::{Context, Result};
use async_trait::async_trait;
use relay_client::JobClient;
use relay_core::dto::job::{ResultResponse, StatusResponse};

/// Repository trait for the queries the status poller makes
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Fetches the current status of a job
    ///
    /// # Arguments
    /// * `job_id` - The upstream job id
    async fn fetch_status(&self, job_id: &str) -> Result<StatusResponse>;

    /// Fetches the result of a succeeded job
    ///
    /// # Arguments
    /// * `job_id` - The upstream job id
    async fn fetch_result(&self, job_id: &str) -> Result<ResultResponse>;
}

/// HTTP implementation of StatusRepository backed by the job client
pub struct HttpStatusRepository {
    client: JobClient,
}

impl HttpStatusRepository {
    /// Creates a new HTTP status repository
    ///
    /// The client is shared, so credential changes made elsewhere apply
    /// to subsequent polls.
    pub fn new(client: JobClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusRepository for HttpStatusRepository {
    async fn fetch_status(&self, job_id: &str) -> Result<StatusResponse> {
        self.client
            .job_status(job_id)
            .await
            .with_context(|| format!("Failed to fetch status of job {}", job_id))
    }

    async fn fetch_result(&self, job_id: &str) -> Result<ResultResponse> {
        self.client
            .job_result(job_id)
            .await
            .with_context(|| format!("Failed to fetch result of job {}", job_id))
    }
}
