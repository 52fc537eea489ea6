//! JSON event handler for machine-readable run output
//!
//! Every event becomes one JSON object on its own line, so a calling process
//! can follow a run and read its outcome without parsing console text. The
//! `Finished` event produces the `outcome` record and is always last.

use super::{Event, EventHandler};
use crate::settle::SettleResult;
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event handler that writes events as JSON lines
pub struct JsonEventHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventHandler {
    /// Create a new JSON event handler that writes to stdout
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a new JSON event handler with a custom writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    /// Get current timestamp as seconds since Unix epoch
    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            if let Ok(json_str) = serde_json::to_string(&value) {
                let _ = writeln!(output, "{}", json_str);
                let _ = output.flush();
            }
        }
    }

    fn to_json(event: &Event) -> serde_json::Value {
        match event {
            Event::StageEntered { stage } => json!({ "type": "stage", "stage": stage }),
            Event::TaskMissing { task_file } => json!({
                "type": "task_missing",
                "task_file": task_file,
            }),
            Event::TaskLoaded {
                album_name,
                album_url,
            } => json!({
                "type": "task_loaded",
                "album_name": album_name,
                "album_url": album_url,
            }),
            Event::TaskRejected { message } => json!({ "type": "task_rejected", "message": message }),
            Event::DownloadStarted { command, work_dir } => json!({
                "type": "download_started",
                "command": command,
                "work_dir": work_dir,
            }),
            Event::DownloaderOutput { line } => json!({ "type": "downloader_output", "line": line }),
            Event::DownloadFinished { exit } => json!({
                "type": "download_finished",
                "exit_code": exit.code,
                "success": exit.success(),
            }),
            Event::DownloadFailed { message } => json!({ "type": "download_failed", "message": message }),
            Event::Settled { result } => match result {
                SettleResult::Skipped => json!({ "type": "settled", "mode": "none" }),
                SettleResult::Waited(waited) => json!({
                    "type": "settled",
                    "mode": "waited",
                    "waited_ms": waited.as_millis() as u64,
                }),
                SettleResult::Stable { polls } => json!({
                    "type": "settled",
                    "mode": "stable",
                    "polls": polls,
                }),
                SettleResult::TimedOut { waited } => json!({
                    "type": "settled",
                    "mode": "timed_out",
                    "waited_ms": waited.as_millis() as u64,
                }),
            },
            Event::ScanStarted { scan_dir } => json!({ "type": "scan_started", "scan_dir": scan_dir }),
            Event::ScanFailed { message } => json!({ "type": "scan_failed", "message": message }),
            Event::ScanComplete { files } => json!({
                "type": "scan_complete",
                "count": files.len(),
                "files": files,
            }),
            Event::FileValid { path } => json!({ "type": "file_valid", "path": path }),
            Event::FileCorrupted { path, reason } => json!({
                "type": "file_corrupted",
                "path": path,
                "reason": reason,
            }),
            Event::FileRemoved { path } => json!({ "type": "file_removed", "path": path }),
            Event::FileRemovalFailed { path, message } => json!({
                "type": "file_removal_failed",
                "path": path,
                "message": message,
            }),
            Event::ValidatorUnavailable { message } => json!({
                "type": "validator_unavailable",
                "message": message,
            }),
            Event::Finished { record } => {
                let mut value = serde_json::to_value(record).unwrap_or_else(|_| json!({}));
                if let Some(map) = value.as_object_mut() {
                    map.insert("type".to_string(), json!("outcome"));
                }
                value
            }
        }
    }
}

impl EventHandler for JsonEventHandler {
    fn handle(&self, event: &Event) {
        let mut value = Self::to_json(event);
        if let Some(map) = value.as_object_mut() {
            map.insert("timestamp".to_string(), json!(Self::get_timestamp()));
        }
        self.write_json(value);
    }
}

impl Default for JsonEventHandler {
    fn default() -> Self {
        Self::new()
    }
}
