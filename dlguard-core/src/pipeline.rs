// ============================================================================
// dlguard-core/src/pipeline.rs
// ============================================================================
//
// PIPELINE: One Controller Run from Task Descriptor to Outcome
//
// load task -> download -> settle -> scan -> validate -> outcome
//
// Each stage returns an explicit result which `execute` folds into a single
// `RunOutcome`. Nothing here exits the process or prints; progress is
// reported through the event dispatcher and the outcome is returned.
//
// AI-ASSISTANT-INFO: Controller orchestrating download and validation stages

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use log::{debug, warn};
use serde::Serialize;

use crate::config::ControllerConfig;
use crate::discovery::{find_new_media_files, snapshot_media_files};
use crate::events::{Event, EventDispatcher};
use crate::external::{CommandDownloader, Downloader, FfmpegValidator, MediaValidator};
use crate::outcome::RunOutcome;
use crate::settle::{SettleResult, wait_for_settle};
use crate::task::{TaskDescriptor, TaskLoad, load_task};
use crate::validation::{ValidationReport, validate_files};

/// Position of a run in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    TaskLoaded,
    Downloading,
    DownloadFailed,
    Downloaded,
    Settling,
    Scanning,
    Validating,
    ValidationFailed,
    ValidationPassed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::TaskLoaded => "task loaded",
            Stage::Downloading => "downloading",
            Stage::DownloadFailed => "download failed",
            Stage::Downloaded => "downloaded",
            Stage::Settling => "settling",
            Stage::Scanning => "scanning",
            Stage::Validating => "validating",
            Stage::ValidationFailed => "validation failed",
            Stage::ValidationPassed => "validation passed",
        };
        f.write_str(name)
    }
}

/// Runs the download-and-validate pipeline once.
pub struct Controller<D, V> {
    config: ControllerConfig,
    downloader: D,
    validator: V,
    events: EventDispatcher,
}

impl Controller<CommandDownloader, FfmpegValidator> {
    /// Controller that runs the configured downloader and decoder programs.
    pub fn from_config(config: ControllerConfig, events: EventDispatcher) -> Self {
        let downloader = CommandDownloader::from_config(&config);
        let validator = FfmpegValidator::new(config.validator_program.clone());
        Self::new(config, downloader, validator, events)
    }
}

impl<D, V> Controller<D, V>
where
    D: Downloader,
    V: MediaValidator,
{
    pub fn new(config: ControllerConfig, downloader: D, validator: V, events: EventDispatcher) -> Self {
        Self {
            config,
            downloader,
            validator,
            events,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Runs the pipeline and emits the final `Finished` event.
    pub fn run(&self) -> RunOutcome {
        let outcome = self.execute();
        debug!("Run finished: {:?}", outcome.kind());
        self.events.emit(Event::Finished {
            record: outcome.record(),
        });
        outcome
    }

    fn enter(&self, stage: Stage) {
        debug!("Entering stage: {stage}");
        self.events.emit(Event::StageEntered { stage });
    }

    fn execute(&self) -> RunOutcome {
        self.enter(Stage::Idle);

        if let Err(e) = self.config.validate() {
            return RunOutcome::Error {
                message: e.to_string(),
            };
        }

        let task = match load_task(&self.config.task_file) {
            Ok(TaskLoad::Absent) => {
                self.events.emit(Event::TaskMissing {
                    task_file: self.config.task_file.clone(),
                });
                return RunOutcome::NoTask;
            }
            Ok(TaskLoad::Loaded(task)) => task,
            Err(e) => {
                let message = e.to_string();
                self.events.emit(Event::TaskRejected {
                    message: message.clone(),
                });
                return RunOutcome::TaskInvalid { message };
            }
        };
        self.events.emit(Event::TaskLoaded {
            album_name: task.display_name().to_string(),
            album_url: task.album_url.clone(),
        });
        self.enter(Stage::TaskLoaded);

        self.enter(Stage::Downloading);
        let started_at = SystemTime::now();
        if let Err(outcome) = self.download(&task) {
            self.enter(Stage::DownloadFailed);
            return outcome;
        }
        self.enter(Stage::Downloaded);

        self.enter(Stage::Settling);
        self.settle();

        self.enter(Stage::Scanning);
        let files = self.scan(started_at);

        self.enter(Stage::Validating);
        let report = validate_files(&self.validator, &files, &self.events);
        self.finish_validation(task, report)
    }

    fn download(&self, task: &TaskDescriptor) -> Result<(), RunOutcome> {
        self.events.emit(Event::DownloadStarted {
            command: self.downloader.command_line(&task.album_url),
            work_dir: self.config.work_dir.clone(),
        });

        let result = self.downloader.download(&task.album_url, |line| {
            self.events.emit(Event::DownloaderOutput {
                line: line.to_string(),
            });
        });

        match result {
            Ok(exit) => {
                self.events.emit(Event::DownloadFinished { exit });
                if exit.success() {
                    Ok(())
                } else {
                    Err(RunOutcome::DownloadFailed {
                        task: task.clone(),
                        exit: Some(exit),
                        message: format!("Downloader failed with {exit}"),
                    })
                }
            }
            Err(e) => {
                let message = e.to_string();
                self.events.emit(Event::DownloadFailed {
                    message: message.clone(),
                });
                Err(RunOutcome::DownloadFailed {
                    task: task.clone(),
                    exit: None,
                    message,
                })
            }
        }
    }

    fn settle(&self) {
        let scan_dir = &self.config.scan_dir;
        let extensions = &self.config.media_extensions;
        let result = wait_for_settle(self.config.settle, || {
            snapshot_media_files(scan_dir, extensions)
        });
        if let SettleResult::TimedOut { waited } = result {
            warn!(
                "Files under {} were still changing after {:.1}s; scanning anyway",
                scan_dir.display(),
                waited.as_secs_f64()
            );
        }
        self.events.emit(Event::Settled { result });
    }

    /// Scan failures are logged and treated as an empty candidate set.
    fn scan(&self, since: SystemTime) -> Vec<PathBuf> {
        self.events.emit(Event::ScanStarted {
            scan_dir: self.config.scan_dir.clone(),
        });

        let files = match find_new_media_files(&self.config.scan_dir, &self.config.media_extensions, since) {
            Ok(files) => files,
            Err(e) => {
                warn!("{e}");
                self.events.emit(Event::ScanFailed {
                    message: e.to_string(),
                });
                Vec::new()
            }
        };

        self.events.emit(Event::ScanComplete {
            files: files.clone(),
        });
        files
    }

    fn finish_validation(&self, task: TaskDescriptor, report: ValidationReport) -> RunOutcome {
        if report.all_valid() {
            self.enter(Stage::ValidationPassed);
            RunOutcome::Success { task, report }
        } else {
            self.enter(Stage::ValidationFailed);
            RunOutcome::ValidationFailed { task, report }
        }
    }
}
