//! Relay HTTP Client
//!
//! A small, type-safe client for the job control plane. Requests can go
//! straight to the control-plane API or through the gateway (use the
//! gateway's `/<prefix>/<node>` address as the base URL).
//!
//! # Example
//!
//! ```no_run
//! use relay_client::JobClient;
//! use relay_core::dto::job::{JobRequest, SpeechTranscription, SubmitOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = JobClient::new("https://render.example.com").with_api_key("secret")?;
//!
//!     let job = client
//!         .submit(
//!             &JobRequest::SpeechTranscription(SpeechTranscription {
//!                 audio_url: "https://cdn.example.com/a.mp3".to_string(),
//!             }),
//!             &SubmitOptions::default(),
//!         )
//!         .await?;
//!
//!     println!("Submitted job: {}", job.id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod workloads;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use workloads::{DEFAULT_WORKLOADS_URL, WorkloadClient};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};

/// Header carrying the raw render key
pub const RENDER_KEY_HEADER: &str = "x-c3-render-key";

/// HTTP client for the job control plane
///
/// Credentials are held as a ready-made header set that is swapped as a
/// whole, so the render-key header and the bearer header always describe
/// the same key. Clones share the credential slot.
#[derive(Debug, Clone)]
pub struct JobClient {
    /// Base URL of the control plane (e.g., "https://render.example.com")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Credential headers attached to every call
    credentials: Arc<RwLock<HeaderMap>>,
}

impl JobClient {
    /// Create a new client without credentials
    ///
    /// # Example
    /// ```
    /// use relay_client::JobClient;
    ///
    /// let client = JobClient::new("http://localhost:8787/proxy/render.node");
    /// assert!(!client.has_credentials());
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            credentials: Arc::new(RwLock::new(HeaderMap::new())),
        }
    }

    /// Builder-style variant of [`JobClient::set_api_key`]
    pub fn with_api_key(self, api_key: &str) -> Result<Self> {
        self.set_api_key(Some(api_key))?;
        Ok(self)
    }

    /// Get the base URL of the control plane
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace (or clear, with `None`) the credential used by every call
    ///
    /// Both header representations are built first and installed in one
    /// write. On error the previous credential stays in place.
    pub fn set_api_key(&self, api_key: Option<&str>) -> Result<()> {
        let headers = match api_key {
            Some(key) => credential_headers(key)?,
            None => HeaderMap::new(),
        };

        let mut slot = self
            .credentials
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = headers;

        tracing::debug!(
            "Credentials {}",
            if api_key.is_some() { "updated" } else { "cleared" }
        );
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        !self.credential_snapshot().is_empty()
    }

    fn credential_snapshot(&self) -> HeaderMap {
        self.credentials
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Resolve `segments` below the base URL, percent-encoding each one
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("bad base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidRequest("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request with the current credential headers attached
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        Ok(self
            .client
            .request(method, url)
            .headers(self.credential_snapshot()))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Both credential headers for `api_key`, marked sensitive
fn credential_headers(api_key: &str) -> Result<HeaderMap> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(ClientError::InvalidCredential("API key is empty".to_string()));
    }

    let mut raw = HeaderValue::from_str(key)
        .map_err(|e| ClientError::InvalidCredential(e.to_string()))?;
    raw.set_sensitive(true);

    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", key))
        .map_err(|e| ClientError::InvalidCredential(e.to_string()))?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(RENDER_KEY_HEADER), raw);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}
