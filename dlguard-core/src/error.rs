// ============================================================================
// dlguard-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the dlguard Core Library
//
// Every fallible stage of the pipeline reports through `CoreError`. The
// pipeline itself never propagates these past `Controller::run`; they are
// folded into a `RunOutcome` there.
//
// AI-ASSISTANT-INFO: Error types and helper constructors for dlguard-core

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the dlguard core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read task file '{}': {source}", .path.display())]
    TaskRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Task file '{}' is not a valid task descriptor: {source}", .path.display())]
    TaskMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Task file '{}' is missing 'album_url'", .0.display())]
    TaskMissingUrl(PathBuf),

    #[error("Required program '{0}' was not found")]
    DependencyNotFound(String),

    #[error("Failed to start '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed to read output of '{0}': {1}")]
    CommandOutput(String, #[source] io::Error),

    #[error("Failed while waiting for '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("Failed to scan '{}': {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Scan root '{}' is not a directory", .0.display())]
    ScanRootNotDirectory(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for dlguard-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Maps a spawn failure to `DependencyNotFound` when the program is missing,
/// `CommandStart` otherwise.
pub fn command_start_error(program: &str, err: io::Error) -> CoreError {
    if err.kind() == io::ErrorKind::NotFound {
        CoreError::DependencyNotFound(program.to_string())
    } else {
        CoreError::CommandStart(program.to_string(), err)
    }
}

pub fn command_output_error(program: &str, err: io::Error) -> CoreError {
    CoreError::CommandOutput(program.to_string(), err)
}

pub fn command_wait_error(program: &str, err: io::Error) -> CoreError {
    CoreError::CommandWait(program.to_string(), err)
}
