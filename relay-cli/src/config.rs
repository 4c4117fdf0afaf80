//! Configuration module
//!
//! Settings gathered from flags and environment, turned into the
//! tracker's configuration.

use relay_tracker::Config as TrackerConfig;
use std::path::PathBuf;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Control-plane URL, direct or through the gateway
    pub api_url: String,

    /// Render key for control-plane calls
    pub render_key: Option<String>,

    /// Directory holding the job registry
    pub data_dir: PathBuf,

    /// Seconds between status queries
    pub poll_interval: u64,

    /// Default wait ceiling in seconds
    pub max_wait: u64,

    /// Workload listing endpoint
    pub workloads_url: String,

    /// Account key for workload listing
    pub account_key: Option<String>,
}

impl Config {
    pub fn tracker_config(&self) -> TrackerConfig {
        let mut config = TrackerConfig::new(self.api_url.clone()).with_data_dir(&self.data_dir);
        config.api_key = self.render_key.clone();
        config.poll_interval = Duration::from_secs(self.poll_interval);
        config.max_wait = Duration::from_secs(self.max_wait);
        config
    }
}
