//! Command-line shell around the engine: argument parsing, configuration,
//! logging and terminal output.
mod app;
mod config;
mod logging;
mod notify;
mod popup;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use app::run_app;

#[derive(Debug, Parser)]
#[command(
    name = "jobrelay",
    version,
    about = "Extract LinkedIn job listings and relay them to a Google Sheet"
)]
pub struct Cli {
    /// RON configuration file. Defaults to ./jobrelay.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Sheet endpoint, overriding the configured one.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to ./jobrelay.log.
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Extract the listing shown at ACTIVE_URL and relay it, as the keyboard command does.
    #[command(name = "extract-job-data")]
    ExtractJobData {
        /// URL of the page the user is looking at.
        active_url: String,
    },
    /// Extract a job view page and print the record.
    Show {
        url: String,
        /// Copy the record as JSON to the clipboard.
        #[arg(long)]
        copy: bool,
        /// Relay the record to the sheet after showing it.
        #[arg(long)]
        send: bool,
    },
    /// Relay a record stored as JSON.
    Send {
        /// File holding a JSON record; missing fields are sent empty.
        record: PathBuf,
    },
}
