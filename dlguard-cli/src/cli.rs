// dlguard-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "dlguard: download controller with media integrity checks",
    long_about = "Reads a task descriptor, runs the downloader for its album URL, \
                  then decodes every new media file with ffmpeg and deletes the ones \
                  that fail. Exits 0 on success or when there is nothing to do, 1 otherwise."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write a log file for this run into DIR
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Write pipeline events to stdout as JSON lines (console logging moves to stderr)
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the pipeline once for the current task descriptor
    Run(RunArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SettleMode {
    /// Sleep for --settle-ms once
    Fixed,
    /// Poll every --settle-ms until the files stop changing or --settle-timeout-ms passes
    Stable,
    /// Scan immediately
    None,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Working directory of the downloader (default: current directory)
    #[arg(short = 'w', long, value_name = "DIR", env = "DLGUARD_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Task descriptor path (default: WORK_DIR/../album.json)
    #[arg(short = 't', long, value_name = "FILE", env = "DLGUARD_TASK_FILE")]
    pub task_file: Option<PathBuf>,

    /// Directory scanned for new media files (default: WORK_DIR/AM-DL downloads)
    #[arg(long, value_name = "DIR", env = "DLGUARD_SCAN_DIR")]
    pub scan_dir: Option<PathBuf>,

    /// Downloader program; the album URL is passed as its last argument (default: go run main.go)
    #[arg(long, value_name = "PROGRAM", env = "DLGUARD_DOWNLOADER")]
    pub downloader: Option<String>,

    /// Argument placed before the URL; repeat for several
    #[arg(long = "downloader-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub downloader_args: Vec<String>,

    /// Decoder used to check media files
    #[arg(long, value_name = "PROGRAM", env = "DLGUARD_VALIDATOR")]
    pub validator: Option<String>,

    /// Media file extension to validate, without the dot; repeat for several (default: m4a, flac)
    #[arg(long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// How to wait for files to settle after the downloader exits
    #[arg(long, value_enum, default_value_t = SettleMode::Fixed)]
    pub settle: SettleMode,

    /// Settle delay, or poll interval with --settle stable
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub settle_ms: u64,

    /// Upper bound for --settle stable
    #[arg(long, value_name = "MS", default_value_t = 30000)]
    pub settle_timeout_ms: u64,

    /// Write the final outcome record as JSON to FILE
    #[arg(long, value_name = "FILE")]
    pub outcome_file: Option<PathBuf>,
}
