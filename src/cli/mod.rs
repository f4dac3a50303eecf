//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{command, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Downloads HighResMIP daily series and stores them as chunked arrays
pub struct Cli {
    /// Log level, `RUST_LOG` takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and convert every variable of a model
    Download(DownloadArgs),
    /// List the supported models and their variables
    Models {},
}

#[derive(clap::Args)]
pub struct DownloadArgs {
    /// Model identifier, e.g. MRI_AGCM3_2_S_daily
    pub model: String,

    #[arg(long, default_value_t = 1950)]
    pub start_year: i32,

    #[arg(long, default_value_t = 2014)]
    pub end_year: i32,

    /// Defaults to `~/cmip6`
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Jobs run at once, estimated from the memory budget if not given
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long, default_value_t = 4096)]
    pub memory_budget_mb: usize,

    /// Timeout of a single download attempt
    #[arg(long, default_value_t = 3 * 3600)]
    pub timeout_secs: u64,

    /// Delete downloaded source files when done
    #[arg(long)]
    pub cleanup: bool,
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

    ProgressBar::new(size).with_message(message).with_style(style)
}

// -- Tests -------------------------------------------------------------------
