//! Discovery of media files written during the current run.
//!
//! The downloader gives no manifest of what it wrote, so new files are found
//! by comparing modification times against the instant captured just before
//! it was launched. Symlinks to files are treated like the files they point
//! to; symlinked directories are not descended into.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::config::extension_rank;
use crate::error::{CoreError, CoreResult};

/// Size and modification time of one candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Finds media files under `scan_dir` modified strictly after `since`.
///
/// The result is ordered by the extension's position in `extensions`, then
/// by path.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Candidate files; empty if `scan_dir` does not exist
/// * `Err(CoreError::Scan)` - If the directory tree could not be traversed
/// * `Err(CoreError::ScanRootNotDirectory)` - If `scan_dir` exists but is not a directory
///
/// # Examples
///
/// ```rust,no_run
/// use dlguard_core::discovery::find_new_media_files;
/// use std::path::Path;
/// use std::time::SystemTime;
///
/// let started = SystemTime::now();
/// // ... run the downloader ...
/// let extensions = vec!["m4a".to_string(), "flac".to_string()];
/// let files = find_new_media_files(Path::new("AM-DL downloads"), &extensions, started)?;
/// for file in files {
///     println!("{}", file.display());
/// }
/// # Ok::<(), dlguard_core::CoreError>(())
/// ```
pub fn find_new_media_files(
    scan_dir: &Path,
    extensions: &[String],
    since: SystemTime,
) -> CoreResult<Vec<PathBuf>> {
    Ok(scan(scan_dir, extensions)?
        .into_iter()
        .filter(|(_, stamp)| stamp.modified > since)
        .map(|(_, stamp)| stamp.path)
        .collect())
}

/// Every media file under `scan_dir` with its size and mtime.
///
/// Used to detect when the downloader's output has stopped changing.
pub fn snapshot_media_files(scan_dir: &Path, extensions: &[String]) -> CoreResult<Vec<FileStamp>> {
    Ok(scan(scan_dir, extensions)?
        .into_iter()
        .map(|(_, stamp)| stamp)
        .collect())
}

fn scan(scan_dir: &Path, extensions: &[String]) -> CoreResult<Vec<(usize, FileStamp)>> {
    if !scan_dir.exists() {
        log::debug!("Scan root {} does not exist", scan_dir.display());
        return Ok(Vec::new());
    }
    if !scan_dir.is_dir() {
        return Err(CoreError::ScanRootNotDirectory(scan_dir.to_path_buf()));
    }

    let scan_error = |source: walkdir::Error| CoreError::Scan {
        path: scan_dir.to_path_buf(),
        source,
    };

    let mut found = Vec::new();
    for entry in WalkDir::new(scan_dir).sort_by_file_name() {
        let entry = entry.map_err(scan_error)?;
        // Follows a symlink to its target; dangling links are skipped.
        if !entry.path().is_file() {
            continue;
        }
        let Some(rank) = extension_rank(entry.path(), extensions) else {
            continue;
        };
        let metadata = fs::metadata(entry.path()).map_err(|e| stat_error(entry.path(), e))?;
        let modified = metadata.modified().map_err(|e| stat_error(entry.path(), e))?;
        found.push((
            rank,
            FileStamp {
                path: entry.into_path(),
                size: metadata.len(),
                modified,
            },
        ));
    }

    found.sort_by(|(rank_a, a), (rank_b, b)| match rank_a.cmp(rank_b) {
        Ordering::Equal => a.path.cmp(&b.path),
        other => other,
    });
    Ok(found)
}

fn stat_error(path: &Path, err: io::Error) -> CoreError {
    CoreError::Io(io::Error::new(
        err.kind(),
        format!("cannot read metadata of '{}': {err}", path.display()),
    ))
}
