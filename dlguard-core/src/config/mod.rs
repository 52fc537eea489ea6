//! Configuration structures and constants for the dlguard-core library.
//!
//! Every path and external program the pipeline touches lives in
//! [`ControllerConfig`], so a run can be pointed at a temporary tree in tests
//! instead of the fixed layout the controller uses in production.

mod builder;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

pub use builder::ControllerConfigBuilder;

// Default constants

/// File name of the task descriptor, looked up one level above the work dir.
pub const DEFAULT_TASK_FILE_NAME: &str = "album.json";

/// Directory (relative to the work dir) that the downloader writes into.
pub const DEFAULT_SCAN_DIR_NAME: &str = "AM-DL downloads";

/// Program used to run the downloader.
pub const DEFAULT_DOWNLOADER_PROGRAM: &str = "go";

/// Arguments placed before the URL when the default downloader program is used.
pub const DEFAULT_DOWNLOADER_ARGS: &[&str] = &["run", "main.go"];

/// Decoder used to check media integrity.
pub const DEFAULT_VALIDATOR_PROGRAM: &str = "ffmpeg";

/// Extensions (without the dot) of files produced by the downloader.
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &["m4a", "flac"];

/// Wait between downloader exit and the scan.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Upper bound for [`SettlePolicy::UntilStable`].
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait for file metadata to settle after the downloader exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Scan immediately.
    None,
    /// Sleep once for the given duration.
    Fixed(Duration),
    /// Poll the candidate set every `interval` until two consecutive
    /// snapshots match, giving up after `timeout`.
    UntilStable { interval: Duration, timeout: Duration },
}

impl Default for SettlePolicy {
    fn default() -> Self {
        SettlePolicy::Fixed(DEFAULT_SETTLE_DELAY)
    }
}

/// Main configuration structure for a controller run.
///
/// Use [`ControllerConfig::new`] for the production layout derived from a
/// work directory, or [`ControllerConfigBuilder`] to override pieces.
///
/// # Examples
///
/// ```rust
/// use dlguard_core::config::ControllerConfig;
/// use std::path::PathBuf;
///
/// let config = ControllerConfig::new(PathBuf::from("/srv/dl/controller"));
/// assert_eq!(config.task_file, PathBuf::from("/srv/dl/album.json"));
/// assert_eq!(config.scan_dir, PathBuf::from("/srv/dl/controller/AM-DL downloads"));
/// ```
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Working directory of the downloader process
    pub work_dir: PathBuf,

    /// Location of the task descriptor
    pub task_file: PathBuf,

    /// Root of the recursive scan for new media files
    pub scan_dir: PathBuf,

    /// Downloader executable
    pub downloader_program: String,

    /// Arguments passed to the downloader before the URL
    pub downloader_args: Vec<String>,

    /// Decoder executable used for validation
    pub validator_program: String,

    /// Extensions of candidate files, matched case-insensitively
    pub media_extensions: Vec<String>,

    /// Wait applied between download and scan
    pub settle: SettlePolicy,
}

impl ControllerConfig {
    /// Creates a configuration with all defaults derived from `work_dir`.
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            task_file: default_task_file(&work_dir),
            scan_dir: work_dir.join(DEFAULT_SCAN_DIR_NAME),
            work_dir,
            downloader_program: DEFAULT_DOWNLOADER_PROGRAM.to_string(),
            downloader_args: DEFAULT_DOWNLOADER_ARGS.iter().map(|s| s.to_string()).collect(),
            validator_program: DEFAULT_VALIDATOR_PROGRAM.to_string(),
            media_extensions: DEFAULT_MEDIA_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            settle: SettlePolicy::default(),
        }
    }

    /// Checks that the configuration can drive a run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.downloader_program.trim().is_empty() {
            return Err(CoreError::Config("downloader program must not be empty".to_string()));
        }
        if self.validator_program.trim().is_empty() {
            return Err(CoreError::Config("validator program must not be empty".to_string()));
        }
        if self.media_extensions.is_empty() {
            return Err(CoreError::Config(
                "at least one media extension is required".to_string(),
            ));
        }
        for ext in &self.media_extensions {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(CoreError::Config(format!(
                    "invalid media extension '{ext}' (expected e.g. \"flac\")"
                )));
            }
        }
        if let SettlePolicy::UntilStable { interval, .. } = self.settle {
            if interval.is_zero() {
                return Err(CoreError::Config(
                    "settle poll interval must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Position of the path's extension in `media_extensions`, if it is a
    /// candidate media file at all.
    pub fn media_extension_rank(&self, path: &Path) -> Option<usize> {
        extension_rank(path, &self.media_extensions)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

/// Task file location for a work directory: `<work_dir>/../album.json`.
pub fn default_task_file(work_dir: &Path) -> PathBuf {
    match work_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(DEFAULT_TASK_FILE_NAME),
        _ => work_dir.join("..").join(DEFAULT_TASK_FILE_NAME),
    }
}

pub(crate) fn extension_rank(path: &Path, extensions: &[String]) -> Option<usize> {
    let ext = path.extension()?.to_str()?;
    extensions.iter().position(|allowed| allowed.eq_ignore_ascii_case(ext))
}
