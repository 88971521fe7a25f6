//! CLI for the RDM download manager.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rdm_core::config;
use std::path::PathBuf;

use commands::{run_fetch, run_get};

/// Top-level CLI for the RDM download manager.
#[derive(Debug, Parser)]
#[command(name = "rdm")]
#[command(about = "RDM: concurrent download-request manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one or more URLs through the bounded queue.
    Get {
        /// Direct HTTP/HTTPS URLs to download.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Destination directory.
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Run up to N downloads concurrently (default from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Download a single URL, blocking until it finishes. Bypasses the queue.
    Fetch {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Destination directory.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        match cli.command {
            CliCommand::Get { urls, dir, jobs } => run_get(cfg, urls, dir, jobs).await,
            CliCommand::Fetch { url, dir } => run_fetch(cfg, url, dir).await,
        }
    }
}
