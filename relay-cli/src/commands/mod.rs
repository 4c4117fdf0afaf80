//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod node;
mod submit;

pub use job::JobCommands;
pub use submit::SubmitCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a new job
    Submit {
        #[command(subcommand)]
        command: SubmitCommands,
    },
    /// Inspect and follow tracked jobs
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// List running compute nodes
    Nodes,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Submit { command } => submit::handle_submit_command(command, config).await,
        Commands::Jobs { command } => job::handle_job_command(command, config).await,
        Commands::Nodes => node::list_nodes(config).await,
    }
}
