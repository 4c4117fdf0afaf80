//! Shared gateway state

use anyhow::Context;
use reqwest::{Client, redirect};
use std::sync::Arc;

use crate::config::GatewayConfig;

/// Read-only state handed to every request
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub client: Client,
}

impl AppState {
    /// Builds the upstream HTTP client for `config`
    ///
    /// Redirects are relayed to the caller rather than followed.
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}
