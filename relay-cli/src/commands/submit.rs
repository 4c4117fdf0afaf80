//! Submit command handlers
//!
//! One subcommand per job kind; each records the accepted job locally and
//! can optionally stay attached until it finishes.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use relay_core::dto::job::{
    ImageAnalysis, JobRequest, PortraitAnimation, SpeechSynthesis, SpeechTranscription,
    SubmitOptions,
};
use relay_tracker::JobTracker;

use super::job::{print_job_details, wait_and_report};
use crate::config::Config;

/// Options shared by every submission
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// URL the control plane calls when the job finishes
    #[arg(long)]
    callback_url: Option<String>,

    /// Seconds to wait before marking the job failed
    #[arg(long)]
    max_wait: Option<u64>,

    /// Expected completion time in seconds (hint only)
    #[arg(long)]
    estimate: Option<u64>,

    /// Stay attached until the job finishes
    #[arg(short, long)]
    watch: bool,
}

impl CommonArgs {
    fn options(&self) -> SubmitOptions {
        SubmitOptions {
            callback_url: self.callback_url.clone(),
            max_wait_seconds: self.max_wait,
            estimated_seconds: self.estimate,
        }
    }
}

/// Submit subcommands
#[derive(Subcommand)]
pub enum SubmitCommands {
    /// Text-to-speech
    Tts {
        /// Text to speak
        #[arg(long)]
        text: Option<String>,

        /// Reference voice clip
        #[arg(long)]
        audio_url: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Speech-to-text
    Transcribe {
        /// Audio to transcribe
        audio_url: String,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Animate a portrait with an audio track
    Portrait {
        /// Portrait image
        image_url: String,

        /// Driving audio track
        audio_url: String,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Describe an image
    Analyze {
        /// Image to analyze
        image_url: String,

        /// Question or instruction about the image
        #[arg(long)]
        prompt: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

impl SubmitCommands {
    fn into_request(self) -> (JobRequest, CommonArgs) {
        match self {
            SubmitCommands::Tts {
                text,
                audio_url,
                common,
            } => (
                JobRequest::SpeechSynthesis(SpeechSynthesis { text, audio_url }),
                common,
            ),
            SubmitCommands::Transcribe { audio_url, common } => (
                JobRequest::SpeechTranscription(SpeechTranscription { audio_url }),
                common,
            ),
            SubmitCommands::Portrait {
                image_url,
                audio_url,
                common,
            } => (
                JobRequest::PortraitAnimation(PortraitAnimation {
                    image_url,
                    audio_url,
                }),
                common,
            ),
            SubmitCommands::Analyze {
                image_url,
                prompt,
                common,
            } => (
                JobRequest::ImageAnalysis(ImageAnalysis { image_url, prompt }),
                common,
            ),
        }
    }
}

/// Handle submit commands
pub async fn handle_submit_command(command: SubmitCommands, config: &Config) -> Result<()> {
    let (request, common) = command.into_request();
    let tracker = JobTracker::open(&config.tracker_config())?;

    let job = tracker.submit(&request, &common.options()).await?;

    println!("{}", "✓ Job submitted".green().bold());
    println!("  ID:     {}", job.id.cyan());
    println!("  Kind:   {}", job.kind);
    println!("  Status: {}", job.status.to_string().yellow());

    if common.watch {
        println!();
        println!("{}", "Waiting for the job to finish...".dimmed());
        let job = wait_and_report(&tracker, &job.id).await?;
        println!();
        print_job_details(&job);
    } else {
        tracker.abandon(&job.id);
        println!();
        println!(
            "{}",
            format!("Follow it with: relay jobs watch {}", job.id).dimmed()
        );
    }

    Ok(())
}
