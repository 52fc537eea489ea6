//! Pipeline events and their fan-out to handlers.
//!
//! The core never prints. Everything a user or a calling process might want
//! to see is emitted as an [`Event`]; the CLI decides how to render it.

use std::path::PathBuf;
use std::sync::Arc;

use crate::external::ToolExit;
use crate::outcome::OutcomeRecord;
use crate::pipeline::Stage;
use crate::settle::SettleResult;

pub mod json_handler;

pub use json_handler::JsonEventHandler;

#[derive(Debug, Clone)]
pub enum Event {
    StageEntered {
        stage: Stage,
    },

    // Task events
    TaskMissing {
        task_file: PathBuf,
    },
    TaskLoaded {
        album_name: String,
        album_url: String,
    },
    TaskRejected {
        message: String,
    },

    // Download events
    DownloadStarted {
        command: String,
        work_dir: PathBuf,
    },
    /// One raw line of downloader stdout or stderr, unfiltered.
    DownloaderOutput {
        line: String,
    },
    DownloadFinished {
        exit: ToolExit,
    },
    /// The downloader could not be run or its output could not be read.
    DownloadFailed {
        message: String,
    },

    Settled {
        result: SettleResult,
    },

    // Scan events
    ScanStarted {
        scan_dir: PathBuf,
    },
    ScanFailed {
        message: String,
    },
    ScanComplete {
        files: Vec<PathBuf>,
    },

    // Validation events
    FileValid {
        path: PathBuf,
    },
    FileCorrupted {
        path: PathBuf,
        reason: String,
    },
    FileRemoved {
        path: PathBuf,
    },
    FileRemovalFailed {
        path: PathBuf,
        message: String,
    },
    ValidatorUnavailable {
        message: String,
    },

    /// Always the last event of a run.
    Finished {
        record: OutcomeRecord,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
