//! Node command handler
//!
//! Lists running workloads so a node name can be used in gateway paths.

use anyhow::{Result, anyhow};
use colored::*;
use relay_client::WorkloadClient;
use relay_core::domain::workload::Workload;

use crate::config::Config;

/// List running workloads
pub async fn list_nodes(config: &Config) -> Result<()> {
    let key = config
        .account_key
        .clone()
        .ok_or_else(|| anyhow!("An account key is required (--account-key or C3_API_KEY)"))?;
    let client = WorkloadClient::new(config.workloads_url.clone(), key);

    let workloads = client.running_workloads().await?;

    if workloads.is_empty() {
        println!("{}", "No running workloads.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} running workload(s):", workloads.len()).bold()
        );
        println!();
        for workload in &workloads {
            print_workload(workload);
        }
    }

    Ok(())
}

fn print_workload(workload: &Workload) {
    let kind = if workload.is_media() {
        workload.workload_type.green()
    } else {
        workload.workload_type.normal()
    };

    println!("  {} Node {}", "▸".cyan(), workload.node.bold());
    println!("    Type:     {}", kind);
    if let Some(status) = &workload.status {
        println!("    Status:   {}", status);
    }
    if workload.is_media() {
        println!("    Gateway:  /proxy/{}", workload.ui_node().cyan());
    }
    println!();
}
