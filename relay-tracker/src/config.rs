//! Tracker configuration
//!
//! Defines the connection settings for the control plane and the
//! polling cadence used for every tracked job.

use std::path::PathBuf;
use std::time::Duration;

/// Default time between status queries for one job
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default client-side ceiling on how long a job is observed
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(15 * 60);

/// Tracker configuration
///
/// Intervals are configurable to allow tuning for slow nodes or tests.
#[derive(Debug, Clone)]
pub struct Config {
    /// Control-plane base URL, direct or through the gateway
    pub api_url: String,

    /// Render key sent with every control-plane call
    pub api_key: Option<String>,

    /// Directory holding the durable job registry
    pub data_dir: PathBuf,

    /// How often each job's status is queried
    pub poll_interval: Duration,

    /// Wait ceiling for jobs submitted without one
    pub max_wait: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            api_key: None,
            data_dir: PathBuf::from(".relay"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - RELAY_API_URL (required)
    /// - C3_RENDER_KEY (optional)
    /// - RELAY_DATA_DIR (optional, default: .relay)
    /// - RELAY_POLL_INTERVAL (optional, seconds, default: 5)
    /// - RELAY_MAX_WAIT (optional, seconds, default: 900)
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = std::env::var("RELAY_API_URL")
            .map_err(|_| anyhow::anyhow!("RELAY_API_URL environment variable not set"))?;

        let api_key = std::env::var("C3_RENDER_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let data_dir = std::env::var("RELAY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".relay"));

        let poll_interval = std::env::var("RELAY_POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let max_wait = std::env::var("RELAY_MAX_WAIT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_MAX_WAIT);

        Ok(Self {
            api_url,
            api_key,
            data_dir,
            poll_interval,
            max_wait,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_wait.is_zero() {
            anyhow::bail!("max_wait must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8787".to_string())
    }
}
