//! Job command handlers
//!
//! Browse the local job registry and follow unfinished jobs.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use relay_core::domain::job::{Job, JobStatus};
use relay_tracker::{JobTracker, PollOutcome};

use crate::config::Config;
use crate::id_resolver::resolve_job_id;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List all tracked jobs
    List {
        /// Only show jobs that have not finished
        #[arg(short, long)]
        pending: bool,
    },
    /// Show job details
    Show {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Follow jobs until they finish
    Watch {
        /// Job ID or unambiguous prefix; every unfinished job when omitted
        id: Option<String>,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let tracker = JobTracker::open(&config.tracker_config())?;

    match command {
        JobCommands::List { pending } => list_jobs(&tracker, pending),
        JobCommands::Show { id } => show_job(&tracker, &id),
        JobCommands::Watch { id: Some(id) } => {
            let id = resolve_job_id(&tracker.registry().list(), &id)?;
            let job = wait_and_report(&tracker, &id).await?;
            print_job_details(&job);
            Ok(())
        }
        JobCommands::Watch { id: None } => watch_pending(&tracker).await,
    }
}

fn list_jobs(tracker: &JobTracker, pending_only: bool) -> Result<()> {
    let jobs = if pending_only {
        tracker.registry().pending()
    } else {
        tracker.registry().list()
    };

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

fn show_job(tracker: &JobTracker, id: &str) -> Result<()> {
    let id = resolve_job_id(&tracker.registry().list(), id)?;
    let job = tracker.registry().get(&id)?;
    print_job_details(&job);
    Ok(())
}

/// Watches one job until its poll task ends and returns its final record
pub async fn wait_and_report(tracker: &JobTracker, id: &str) -> Result<Job> {
    let job = tracker.registry().get(id)?;
    if job.is_terminal() {
        return Ok(job);
    }

    tracker.watch(id)?;
    let (job, outcome) = tracker
        .wait(id)
        .await
        .with_context(|| format!("Failed to follow job {}", id))?;

    if let Some(outcome) = outcome {
        print_outcome(&job.id, &outcome);
    }
    Ok(job)
}

async fn watch_pending(tracker: &JobTracker) -> Result<()> {
    let started = tracker.resume();
    if started == 0 {
        println!("{}", "No unfinished jobs to watch.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Watching {} unfinished job(s)...", started).bold()
    );
    for (id, outcome) in tracker.wait_all().await {
        print_outcome(&id, &outcome);
    }

    Ok(())
}

fn print_outcome(id: &str, outcome: &PollOutcome) {
    match outcome {
        PollOutcome::Succeeded => println!("{} Job {} succeeded", "✓".green(), id.cyan()),
        PollOutcome::Failed(reason) => {
            println!("{} Job {} failed: {}", "✗".red(), id.cyan(), reason.red())
        }
        PollOutcome::TimedOut => println!("{} Job {} timed out", "✗".red(), id.cyan()),
        PollOutcome::Cancelled => println!("{} Stopped watching {}", "-".dimmed(), id.cyan()),
    }
}

/// Print a one-job summary
fn print_job_summary(job: &Job) {
    println!("  {} Job {}", "▸".cyan(), job.id.dimmed());
    println!("    Kind:     {}", job.kind);
    println!("    Status:   {}", colorize_status(&job.status));
    println!(
        "    Created:  {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
pub fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:       {}", job.id.cyan());
    println!("  Kind:     {}", job.kind);
    println!("  Status:   {}", colorize_status(&job.status));
    println!("  Created:  {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(max_wait) = job.max_wait_seconds {
        println!("  Max wait: {}s", max_wait);
    }

    if let Some(result) = &job.result {
        println!("\n{}", "Result:".bold());
        if let Some(url) = &result.result_url {
            println!("  URL:  {}", url.cyan());
        }
        if let Some(text) = &result.text {
            println!("  Text:");
            for line in text.lines() {
                println!("    {}", line);
            }
        }
    }

    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

/// Colorize job status for display
fn colorize_status(status: &JobStatus) -> colored::ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Queued => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Succeeded => status_str.green(),
        JobStatus::Failed => status_str.red(),
    }
}
