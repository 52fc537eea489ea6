// ============================================================================
// dlguard-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: Human-Readable Rendering of Pipeline Events
//
// Events are turned into log records, so the same lines reach the console
// and the per-run log file. Downloader progress redraws are noisy; they are
// never logged, and on an interactive terminal the latest one is shown in a
// spinner instead.
//
// AI-ASSISTANT-INFO: Console event handler and progress-line filter

use std::sync::Mutex;
use std::time::Duration;

use console::style;
use dlguard_core::{Event, EventHandler, SettleResult, Stage};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};

/// Markers that identify a throughput figure in a progress line.
const THROUGHPUT_MARKERS: &[&str] = &["MB/s", "KB/s", "kB/s", "MiB/s", "KiB/s", "GB/s"];

/// True for downloader lines that only redraw a progress indicator.
pub fn is_transient_progress(line: &str) -> bool {
    line.contains('%') || THROUGHPUT_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Renders events for a person watching the console.
pub struct ConsoleEventHandler {
    spinner: Mutex<Option<ProgressBar>>,
    interactive: bool,
}

impl ConsoleEventHandler {
    pub fn new() -> Self {
        Self::with_interactive(console::Term::stderr().is_term())
    }

    /// `interactive` enables the progress spinner.
    pub fn with_interactive(interactive: bool) -> Self {
        Self {
            spinner: Mutex::new(None),
            interactive,
        }
    }

    /// Runs `f` with the spinner hidden so its output is not overdrawn.
    fn print(&self, f: impl FnOnce()) {
        match self.spinner.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(pb) => pb.suspend(f),
                None => f(),
            },
            Err(_) => f(),
        }
    }

    fn show_progress(&self, line: &str) {
        if !self.interactive {
            return;
        }
        if let Ok(mut guard) = self.spinner.lock() {
            let pb = guard.get_or_insert_with(|| {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("  {spinner} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner())
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
                );
                pb.enable_steady_tick(Duration::from_millis(120));
                pb
            });
            pb.set_message(line.trim().to_string());
        }
    }

    fn finish_progress(&self) {
        if let Ok(mut guard) = self.spinner.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for ConsoleEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for ConsoleEventHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::StageEntered { stage } => {
                if matches!(stage, Stage::Downloaded | Stage::DownloadFailed) {
                    self.finish_progress();
                }
                debug!("Stage: {stage}");
            }

            Event::TaskMissing { task_file } => {
                info!("No task descriptor at {}; nothing to do", task_file.display());
            }
            Event::TaskLoaded {
                album_name,
                album_url,
            } => {
                info!("{} {}", style("Album:").bold(), album_name);
                info!("{} {}", style("URL:").bold(), album_url);
            }
            Event::TaskRejected { message } => error!("{message}"),

            Event::DownloadStarted { command, work_dir } => {
                info!("Downloading...");
                debug!("Running `{}` in {}", command, work_dir.display());
            }
            Event::DownloaderOutput { line } => {
                let line = strip_ansi_escapes::strip_str(line);
                if line.trim().is_empty() {
                    return;
                }
                if is_transient_progress(&line) {
                    self.show_progress(&line);
                } else {
                    self.print(|| info!("  {line}"));
                }
            }
            Event::DownloadFinished { exit } => {
                if exit.success() {
                    info!("{} Download finished", style("✓").green().bold());
                } else {
                    error!("Downloader failed with {exit}");
                }
            }
            Event::DownloadFailed { message } => error!("{message}"),

            Event::Settled { result } => match result {
                SettleResult::Skipped => {}
                SettleResult::Waited(waited) => {
                    debug!("Waited {:.1}s for files to settle", waited.as_secs_f64())
                }
                SettleResult::Stable { polls } => debug!("Files settled after {polls} checks"),
                SettleResult::TimedOut { waited } => debug!(
                    "Files still changing after {:.1}s",
                    waited.as_secs_f64()
                ),
            },

            Event::ScanStarted { scan_dir } => {
                debug!("Scanning {} for new media files", scan_dir.display());
            }
            Event::ScanFailed { message } => warn!("Scan failed: {message}"),
            Event::ScanComplete { files } => match files.len() {
                0 => info!("No new media files to validate"),
                n => info!("Validating {n} new media file(s)..."),
            },

            Event::FileValid { path } => {
                info!("  {} {}", style("✓").green(), path.display());
            }
            Event::FileCorrupted { path, reason } => {
                error!("Corrupted: {}", path.display());
                for line in reason.lines() {
                    info!("    {}", style(line).dim());
                }
            }
            Event::FileRemoved { path } => info!("  Removed {}", path.display()),
            Event::FileRemovalFailed { path, message } => {
                warn!("Could not remove {}: {message}", path.display());
            }
            Event::ValidatorUnavailable { message } => error!("{message}"),

            Event::Finished { record } => {
                self.finish_progress();
                if record.exit_code == 0 {
                    info!("{} {}", style("✓").green().bold(), record.message);
                } else {
                    error!("{}", record.message);
                }
            }
        }
    }
}
