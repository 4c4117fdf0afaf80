//! Relay CLI
//!
//! Submit generative jobs, follow them to completion and browse the local
//! job history.

mod commands;
mod config;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Submit and track generative media jobs", long_about = None)]
struct Cli {
    /// Control-plane URL, direct or through the gateway
    #[arg(long, env = "RELAY_API_URL", default_value = "http://localhost:8787")]
    api_url: String,

    /// Render key sent with every control-plane call
    #[arg(long, env = "C3_RENDER_KEY", hide_env_values = true)]
    render_key: Option<String>,

    /// Directory holding the local job registry
    #[arg(long, env = "RELAY_DATA_DIR", default_value = ".relay")]
    data_dir: PathBuf,

    /// Seconds between status queries
    #[arg(long, env = "RELAY_POLL_INTERVAL", default_value_t = 5)]
    poll_interval: u64,

    /// Default seconds to wait for a job before marking it failed
    #[arg(long, env = "RELAY_MAX_WAIT", default_value_t = 900)]
    max_wait: u64,

    /// Workload listing endpoint
    #[arg(long, env = "C3_WORKLOADS_URL", default_value = relay_client::DEFAULT_WORKLOADS_URL)]
    workloads_url: String,

    /// Account key for listing workloads
    #[arg(long, env = "C3_API_KEY", hide_env_values = true)]
    account_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_cli=info,relay_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        render_key: cli.render_key,
        data_dir: cli.data_dir,
        poll_interval: cli.poll_interval,
        max_wait: cli.max_wait,
        workloads_url: cli.workloads_url,
        account_key: cli.account_key,
    };

    tracing::debug!(
        "Control plane {}, registry in {}",
        config.api_url,
        config.data_dir.display()
    );

    handle_command(cli.command, &config).await
}
