//! Validation of downloaded media files.
//!
//! Each candidate is checked in order. A corrupted file is deleted as soon as
//! it is found; failing to delete it is reported but does not stop the loop.
//! If the validator itself cannot be run, validation stops at that file and
//! nothing further is checked or deleted.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::events::{Event, EventDispatcher};
use crate::external::{MediaValidator, Verdict};

/// What happened when a corrupted file was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    Failed(String),
}

/// Verdict for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    pub path: PathBuf,
    pub verdict: Verdict,
    /// Set for corrupted files only.
    pub removal: Option<Removal>,
}

/// Results of validating a candidate set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub checks: Vec<FileCheck>,
    /// Why validation stopped early, if it did.
    pub aborted: Option<String>,
}

impl ValidationReport {
    /// True when every checked file decoded cleanly and nothing stopped the
    /// loop. An empty report is valid.
    pub fn all_valid(&self) -> bool {
        self.aborted.is_none() && self.checks.iter().all(|check| check.verdict.is_valid())
    }

    pub fn corrupted(&self) -> impl Iterator<Item = &FileCheck> {
        self.checks.iter().filter(|check| !check.verdict.is_valid())
    }

    /// Corrupted files that were actually deleted.
    pub fn removed_count(&self) -> usize {
        self.corrupted()
            .filter(|check| check.removal == Some(Removal::Deleted))
            .count()
    }

    pub fn checked_count(&self) -> usize {
        self.checks.len()
    }
}

/// Checks `files` with `validator`, deleting the ones it rejects.
pub fn validate_files<V>(validator: &V, files: &[PathBuf], events: &EventDispatcher) -> ValidationReport
where
    V: MediaValidator + ?Sized,
{
    let mut report = ValidationReport::default();

    for path in files {
        debug!("Checking {}", path.display());
        let verdict = match validator.check(path) {
            Ok(verdict) => verdict,
            Err(e) => {
                let message = e.to_string();
                warn!("Validation aborted: {message}");
                events.emit(Event::ValidatorUnavailable {
                    message: message.clone(),
                });
                report.aborted = Some(message);
                break;
            }
        };

        let removal = match &verdict {
            Verdict::Valid => {
                events.emit(Event::FileValid { path: path.clone() });
                None
            }
            Verdict::Corrupted { reason } => {
                events.emit(Event::FileCorrupted {
                    path: path.clone(),
                    reason: reason.clone(),
                });
                Some(remove_corrupted(path, events))
            }
        };

        report.checks.push(FileCheck {
            path: path.clone(),
            verdict,
            removal,
        });
    }

    report
}

fn remove_corrupted(path: &Path, events: &EventDispatcher) -> Removal {
    match fs::remove_file(path) {
        Ok(()) => {
            events.emit(Event::FileRemoved {
                path: path.to_path_buf(),
            });
            Removal::Deleted
        }
        Err(e) => {
            warn!("Failed to remove corrupted file {}: {e}", path.display());
            events.emit(Event::FileRemovalFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
            Removal::Failed(e.to_string())
        }
    }
}
