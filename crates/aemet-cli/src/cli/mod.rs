//! CLI for aemet-sync.

mod commands;

use aemet_core::config::{self, AemetConfig};
use aemet_core::control::CancelToken;
use aemet_core::error::ConfigError;
use aemet_core::request::FetchRequest;
use aemet_core::storage::StatePaths;
use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_aggregate, run_batch_cmd, run_fetch, run_status};

/// Top-level CLI for aemet-sync.
#[derive(Debug, Parser)]
#[command(name = "aemet-sync")]
#[command(
    about = "aemet-sync: resumable, chunked download of AEMET daily station records",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Date window shared by every station command.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct WindowArgs {
    /// First day of the range (inclusive).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: NaiveDate,
    /// Last day of the range.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end: NaiveDate,
    /// Chunk size in months (default: `chunk_months` from the config).
    #[arg(long, value_name = "N")]
    pub months: Option<u32>,
}

impl WindowArgs {
    pub fn request(&self, station: &str, cfg: &AemetConfig) -> Result<FetchRequest, ConfigError> {
        FetchRequest::new(
            station,
            self.start,
            self.end,
            self.months.unwrap_or(cfg.chunk_months),
        )
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one station's range and write its CSV.
    Fetch {
        /// Station identifier (indicativo), e.g. 0200E.
        #[arg(long)]
        station: String,
        #[command(flatten)]
        window: WindowArgs,
        /// Directory for the CSV (default: `output_dir` from the config, else the current directory).
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Download several stations over the same range.
    Batch {
        /// Station identifiers.
        #[arg(required = true)]
        stations: Vec<String>,
        #[command(flatten)]
        window: WindowArgs,
        /// Run up to N stations concurrently (default 1).
        #[arg(long, default_value = "1", value_name = "N")]
        jobs: usize,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Rebuild a station's CSV from cached chunks only (no network, no API key).
    Aggregate {
        #[arg(long)]
        station: String,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Show the progress of every known station range.
    Status,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let paths = StatePaths::from_config(&cfg)?;

        match cli.command {
            CliCommand::Fetch {
                station,
                window,
                out_dir,
            } => {
                let request = window.request(&station, &cfg)?;
                let out_dir = out_dir.unwrap_or_else(|| cfg.output_dir());
                run_fetch(&cfg, paths, request, out_dir, shutdown_token()).await?;
            }
            CliCommand::Batch {
                stations,
                window,
                jobs,
                out_dir,
            } => {
                let requests = stations
                    .iter()
                    .map(|s| window.request(s, &cfg))
                    .collect::<Result<Vec<_>, _>>()?;
                let out_dir = out_dir.unwrap_or_else(|| cfg.output_dir());
                run_batch_cmd(&cfg, paths, requests, jobs, out_dir, shutdown_token()).await?;
            }
            CliCommand::Aggregate {
                station,
                window,
                out_dir,
            } => {
                let request = window.request(&station, &cfg)?;
                let out_dir = out_dir.unwrap_or_else(|| cfg.output_dir());
                run_aggregate(&cfg, &paths, &request, &out_dir)?;
            }
            CliCommand::Status => run_status(&paths)?,
        }

        Ok(())
    }
}

/// Token cancelled on Ctrl-C. Waits in progress return at once; committed
/// progress is kept.
fn shutdown_token() -> CancelToken {
    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping");
            eprintln!("Interrupted, stopping after the current request...");
            on_signal.cancel();
        }
    });
    cancel
}

#[cfg(test)]
mod tests;
