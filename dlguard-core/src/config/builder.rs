// ============================================================================
// dlguard-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for ControllerConfig
//
// Paths left unset are derived from the work directory when `build` runs,
// so overriding only the work dir moves the task file and scan root with it.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for ControllerConfig

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{ControllerConfig, SettlePolicy};

/// Builder for creating ControllerConfig instances.
///
/// # Examples
///
/// ```rust
/// use dlguard_core::config::{ControllerConfigBuilder, SettlePolicy};
/// use std::path::PathBuf;
///
/// let config = ControllerConfigBuilder::new()
///     .work_dir(PathBuf::from("/tmp/work"))
///     .downloader("sh", ["-c", "echo downloading \"$1\"", "sh"])
///     .validator_program("ffmpeg")
///     .settle(SettlePolicy::None)
///     .build();
///
/// assert_eq!(config.task_file, PathBuf::from("/tmp/album.json"));
/// assert_eq!(config.downloader_args.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControllerConfigBuilder {
    work_dir: Option<PathBuf>,
    task_file: Option<PathBuf>,
    scan_dir: Option<PathBuf>,
    downloader: Option<(String, Vec<String>)>,
    validator_program: Option<String>,
    media_extensions: Option<Vec<String>>,
    settle: Option<SettlePolicy>,
}

impl ControllerConfigBuilder {
    /// Creates a new builder; every field falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the working directory of the downloader (default: `.`).
    pub fn work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = Some(work_dir);
        self
    }

    /// Sets the task descriptor path (default: `<work_dir>/../album.json`).
    pub fn task_file(mut self, task_file: PathBuf) -> Self {
        self.task_file = Some(task_file);
        self
    }

    /// Sets the scan root (default: `<work_dir>/AM-DL downloads`).
    pub fn scan_dir(mut self, scan_dir: PathBuf) -> Self {
        self.scan_dir = Some(scan_dir);
        self
    }

    /// Sets the downloader program and the arguments placed before the URL.
    pub fn downloader<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.downloader = Some((program.into(), args.into_iter().map(Into::into).collect()));
        self
    }

    /// Sets the decoder used for validation.
    pub fn validator_program(mut self, program: impl Into<String>) -> Self {
        self.validator_program = Some(program.into());
        self
    }

    /// Replaces the candidate extension allow-list.
    pub fn media_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the wait between downloader exit and scan.
    pub fn settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = Some(settle);
        self
    }

    /// Builds the configuration. Call [`ControllerConfig::validate`] before use.
    pub fn build(self) -> ControllerConfig {
        let mut config = ControllerConfig::new(self.work_dir.unwrap_or_else(|| PathBuf::from(".")));

        if let Some(task_file) = self.task_file {
            config.task_file = task_file;
        }
        if let Some(scan_dir) = self.scan_dir {
            config.scan_dir = scan_dir;
        }
        if let Some((program, args)) = self.downloader {
            config.downloader_program = program;
            config.downloader_args = args;
        }
        if let Some(program) = self.validator_program {
            config.validator_program = program;
        }
        if let Some(extensions) = self.media_extensions {
            config.media_extensions = extensions;
        }
        if let Some(settle) = self.settle {
            config.settle = settle;
        }

        config
    }
}
