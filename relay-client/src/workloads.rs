//! Workload discovery
//!
//! Lists the compute workloads currently running for an account so a
//! caller can find a node name to address through the gateway.

use relay_core::domain::workload::Workload;
use reqwest::Client;
use serde_json::json;

use crate::error::{ClientError, Result};

/// Workload listing endpoint of the compute platform
pub const DEFAULT_WORKLOADS_URL: &str = "https://api.comput3.ai/api/v0/workloads";

/// Header the workload API reads the account key from
const API_KEY_HEADER: &str = "x-c3-api-key";

/// Client for the workload listing API
#[derive(Debug, Clone)]
pub struct WorkloadClient {
    url: String,
    api_key: String,
    client: Client,
}

impl WorkloadClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    /// List running workloads
    pub async fn running_workloads(&self) -> Result<Vec<Workload>> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::InvalidCredential(
                "an API key is required to list workloads".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "running": true }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        let workloads: Vec<Workload> = response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse workloads: {}", e)))?;

        tracing::info!("Found {} running workload(s)", workloads.len());
        Ok(workloads)
    }

    /// First running media workload, if any
    pub async fn media_workload(&self) -> Result<Option<Workload>> {
        let workloads = self.running_workloads().await?;
        let media = workloads.into_iter().find(Workload::is_media);

        match &media {
            Some(w) => tracing::info!("Using media node {} ({})", w.node, w.workload_type),
            None => tracing::warn!("No running media workloads found"),
        }

        Ok(media)
    }
}
