// ============================================================================
// dlguard-core/src/outcome.rs
// ============================================================================
//
// OUTCOME: Final Result of a Controller Run
//
// A run ends in exactly one `RunOutcome`. Its exit code is what the calling
// process sees; `OutcomeRecord` is the serializable summary written to the
// JSON event stream and to the optional outcome file.
//
// AI-ASSISTANT-INFO: Run outcome, exit code mapping and outcome record

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::CoreResult;
use crate::external::ToolExit;
use crate::task::TaskDescriptor;
use crate::validation::ValidationReport;

/// Exit code for success and idle runs.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for every kind of failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    NoTask,
    Success,
    TaskInvalid,
    DownloadFailed,
    ValidationFailed,
    Error,
}

impl OutcomeKind {
    pub fn exit_code(self) -> i32 {
        match self {
            OutcomeKind::NoTask | OutcomeKind::Success => EXIT_SUCCESS,
            _ => EXIT_FAILURE,
        }
    }
}

/// How a run ended, with the details needed to report it.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// No task descriptor was present.
    NoTask,
    TaskInvalid {
        message: String,
    },
    /// The downloader exited non-zero (`exit` is set) or could not be run.
    DownloadFailed {
        task: TaskDescriptor,
        exit: Option<ToolExit>,
        message: String,
    },
    Success {
        task: TaskDescriptor,
        report: ValidationReport,
    },
    ValidationFailed {
        task: TaskDescriptor,
        report: ValidationReport,
    },
    Error {
        message: String,
    },
}

impl RunOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            RunOutcome::NoTask => OutcomeKind::NoTask,
            RunOutcome::TaskInvalid { .. } => OutcomeKind::TaskInvalid,
            RunOutcome::DownloadFailed { .. } => OutcomeKind::DownloadFailed,
            RunOutcome::Success { .. } => OutcomeKind::Success,
            RunOutcome::ValidationFailed { .. } => OutcomeKind::ValidationFailed,
            RunOutcome::Error { .. } => OutcomeKind::Error,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == EXIT_SUCCESS
    }

    /// One-line human summary.
    pub fn message(&self) -> String {
        match self {
            RunOutcome::NoTask => "No task descriptor found; nothing to do".to_string(),
            RunOutcome::TaskInvalid { message } | RunOutcome::Error { message } => message.clone(),
            RunOutcome::DownloadFailed { message, .. } => message.clone(),
            RunOutcome::Success { task, report } => match report.checked_count() {
                0 => format!("Downloaded '{}'; no new media files to validate", task.display_name()),
                n => format!(
                    "Downloaded '{}'; all {n} new media file(s) decoded cleanly",
                    task.display_name()
                ),
            },
            RunOutcome::ValidationFailed { task, report } => match &report.aborted {
                Some(reason) => format!(
                    "Validation of '{}' could not complete: {reason}",
                    task.display_name()
                ),
                None => {
                    let found = report.corrupted().count();
                    let removed = report.removed_count();
                    if removed == found {
                        format!(
                            "Validation of '{}' failed: {found} corrupted file(s) removed",
                            task.display_name()
                        )
                    } else {
                        format!(
                            "Validation of '{}' failed: {found} corrupted file(s) found, {removed} removed",
                            task.display_name()
                        )
                    }
                }
            },
        }
    }

    pub fn record(&self) -> OutcomeRecord {
        let (task, report) = match self {
            RunOutcome::DownloadFailed { task, .. } => (Some(task), None),
            RunOutcome::Success { task, report } | RunOutcome::ValidationFailed { task, report } => {
                (Some(task), Some(report))
            }
            _ => (None, None),
        };

        OutcomeRecord {
            outcome: self.kind(),
            exit_code: self.exit_code(),
            message: self.message(),
            album_name: task.map(|t| t.display_name().to_string()),
            album_url: task.map(|t| t.album_url.clone()),
            downloader_exit_code: match self {
                RunOutcome::DownloadFailed { exit, .. } => exit.and_then(|e| e.code),
                RunOutcome::Success { .. } | RunOutcome::ValidationFailed { .. } => Some(0),
                _ => None,
            },
            files_checked: report.map_or(0, ValidationReport::checked_count),
            corrupted_files: report
                .map(|r| r.corrupted().map(|check| check.path.clone()).collect())
                .unwrap_or_default(),
        }
    }
}

/// Serializable summary of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    pub outcome: OutcomeKind,
    pub exit_code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloader_exit_code: Option<i32>,
    pub files_checked: usize,
    pub corrupted_files: Vec<PathBuf>,
}

impl OutcomeRecord {
    /// Writes the record as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> CoreResult<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }
}
