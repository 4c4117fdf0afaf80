//! Gateway configuration
//!
//! Read once at startup and shared read-only by every request.

use std::time::Duration;

/// Inbound headers copied onto the upstream request, matched case-insensitively
pub const FORWARDED_HEADERS: [&str; 3] = ["x-c3-api-key", "x-c3-session", "cookie"];

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_PREFIX: &str = "/proxy";
pub const DEFAULT_UPSTREAM_SCHEME: &str = "https";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// Path prefix stripped before the node identifier; empty for none
    pub prefix: String,

    /// Scheme used to reach upstream nodes
    pub upstream_scheme: String,

    /// Ceiling on one forwarded call, including reading the response
    pub upstream_timeout: Duration,
}

impl GatewayConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - GATEWAY_BIND_ADDR (default: 0.0.0.0:8787)
    /// - GATEWAY_PREFIX (default: /proxy)
    /// - GATEWAY_UPSTREAM_SCHEME (default: https)
    /// - GATEWAY_UPSTREAM_TIMEOUT (seconds, default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("GATEWAY_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let prefix = std::env::var("GATEWAY_PREFIX")
            .map(|p| normalize_prefix(&p))
            .unwrap_or(defaults.prefix);
        let upstream_scheme = std::env::var("GATEWAY_UPSTREAM_SCHEME")
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or(defaults.upstream_scheme);
        let upstream_timeout = std::env::var("GATEWAY_UPSTREAM_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_timeout);

        Self {
            bind_addr,
            prefix,
            upstream_scheme,
            upstream_timeout,
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = normalize_prefix(prefix);
        self
    }

    pub fn with_upstream_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.upstream_scheme = scheme.into();
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if !self.prefix.is_empty() && !self.prefix.starts_with('/') {
            anyhow::bail!("prefix must start with /");
        }

        if self.upstream_scheme != "http" && self.upstream_scheme != "https" {
            anyhow::bail!("upstream_scheme must be http or https");
        }

        if self.upstream_timeout.is_zero() {
            anyhow::bail!("upstream_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            upstream_scheme: DEFAULT_UPSTREAM_SCHEME.to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

/// `"/"` and `""` both mean no prefix; trailing slashes are dropped
fn normalize_prefix(prefix: &str) -> String {
    prefix.trim().trim_end_matches('/').to_string()
}
