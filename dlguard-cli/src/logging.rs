// ============================================================================
// dlguard-cli/src/logging.rs
// ============================================================================
//
// LOGGING: Console and Per-Run File Logging
//
// Console output goes through an env_logger formatter (bare messages, with
// coloured prefixes for warnings and errors). When a log directory is given,
// fern also writes every record to `dlguard_run_<timestamp>.log` with a
// timestamp and without ANSI sequences.
//
// USAGE:
// - default: info
// - --verbose: debug
// - RUST_LOG overrides the console filter
//
// AI-ASSISTANT-INFO: Logging setup for the CLI

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let log_filename = format!("dlguard_run_{}.log", dlguard_cli::logging::get_timestamp());
/// assert!(log_filename.starts_with("dlguard_run_"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the log file for a run started now.
pub fn run_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("dlguard_run_{}.log", get_timestamp()))
}

/// Installs the global logger.
///
/// Console records go to stderr when `console_to_stderr` is set, so stdout
/// stays reserved for JSON events. Returns the log file path, if any.
pub fn init_logging(
    verbose: bool,
    log_dir: Option<&Path>,
    console_to_stderr: bool,
) -> Result<Option<PathBuf>> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut console_logger = env_logger::Builder::new();
    console_logger
        .format(|buf, record| {
            let message = record.args().to_string();
            match record.level() {
                log::Level::Error => {
                    writeln!(buf, "{} {}", console::style("Error:").red().bold(), message)
                }
                log::Level::Warn => {
                    writeln!(buf, "{} {}", console::style("Warning:").yellow().bold(), message)
                }
                log::Level::Info => writeln!(buf, "{message}"),
                _ => writeln!(buf, "{}", console::style(message).dim()),
            }
        })
        .filter_level(level)
        .target(if console_to_stderr {
            env_logger::Target::Stderr
        } else {
            env_logger::Target::Stdout
        });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        console_logger.parse_filters(&filters);
    }
    let console_logger = console_logger.build();
    let console_level = console_logger.filter();

    let mut dispatch = fern::Dispatch::new()
        .level(level.max(console_level))
        .chain(
            fern::Dispatch::new()
                .level(console_level)
                .chain(Box::new(console_logger) as Box<dyn log::Log>),
        );

    let log_path = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
            let path = run_log_path(dir);
            let file = fern::log_file(&path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            dispatch = dispatch.chain(
                fern::Dispatch::new()
                    .level(level)
                    .format(|out, message, record| {
                        let text = strip_ansi_escapes::strip_str(message.to_string());
                        out.finish(format_args!(
                            "{} [{}] {}",
                            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                            record.level(),
                            text
                        ))
                    })
                    .chain(file),
            );
            Some(path)
        }
        None => None,
    };

    dispatch.apply().context("Failed to install logger")?;
    Ok(log_path)
}
