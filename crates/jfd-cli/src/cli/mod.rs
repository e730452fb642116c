//! CLI for the jfd series downloader.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jfd_core::config;
use std::path::PathBuf;

use commands::{run_abort, run_fetch, run_pause, run_resume, run_serve, run_start, run_status};

/// Top-level CLI for jfd.
#[derive(Debug, Parser)]
#[command(name = "jfd")]
#[command(about = "jfd: time-windowed Jellyfin series downloader", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/jfd/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the download service and listen on the control socket.
    Serve,

    /// Download a whole series in the foreground (Ctrl-C aborts).
    Fetch {
        /// Web-client link to the series (its fragment carries `id=`).
        url: String,
        /// Destination below the configured media root.
        #[arg(long, default_value = "")]
        subdir: String,
    },

    /// Ask a running `jfd serve` to download a series.
    Start {
        /// Web-client link to the series (its fragment carries `id=`).
        url: String,
        /// Destination below the configured media root.
        #[arg(long, default_value = "")]
        subdir: String,
    },

    /// Pause the running download.
    Pause,

    /// Resume the paused download.
    Resume,

    /// Abort the running download. The current partial file is kept unless configured otherwise.
    Abort,

    /// Show the status of the current download.
    Status {
        /// Print the raw JSON status.
        #[arg(long)]
        json: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let load_config = || match &cli.config {
            Some(path) => config::load_from_path(path),
            None => config::load_or_init(),
        };

        match &cli.command {
            CliCommand::Serve => {
                let cfg = load_config()?;
                tracing::debug!(server = %cfg.server_url, root = %cfg.media_root.display(), "loaded config");
                run_serve(&cfg).await?;
            }
            CliCommand::Fetch { url, subdir } => {
                let cfg = load_config()?;
                tracing::debug!(server = %cfg.server_url, root = %cfg.media_root.display(), "loaded config");
                run_fetch(&cfg, url, subdir).await?;
            }
            CliCommand::Start { url, subdir } => run_start(url, subdir).await?,
            CliCommand::Pause => run_pause().await?,
            CliCommand::Resume => run_resume().await?,
            CliCommand::Abort => run_abort().await?,
            CliCommand::Status { json } => run_status(*json).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
