// dlguard-core/tests/common/mod.rs
//
// Shared fakes for the pipeline integration tests.

#![allow(dead_code)]

use dlguard_core::{
    ControllerConfig, ControllerConfigBuilder, CoreError, CoreResult, Downloader, Event,
    EventHandler, MediaValidator, SettlePolicy, ToolExit, Verdict,
};
use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Temporary layout: `<root>/controller` is the work dir, the task file sits
/// in `<root>`, and downloads land in `<root>/controller/AM-DL downloads`.
pub struct Layout {
    pub root: tempfile::TempDir,
}

impl Layout {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(root.path().join("controller")).expect("Failed to create work dir");
        Self { root }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("controller")
    }

    pub fn task_file(&self) -> PathBuf {
        self.root.path().join("album.json")
    }

    pub fn scan_dir(&self) -> PathBuf {
        self.work_dir().join("AM-DL downloads")
    }

    pub fn write_task(&self, json: &str) {
        fs::write(self.task_file(), json).expect("Failed to write task file");
    }

    pub fn config(&self) -> ControllerConfig {
        ControllerConfigBuilder::new()
            .work_dir(self.work_dir())
            .settle(SettlePolicy::None)
            .build()
    }

    /// Creates a media file that predates the run.
    pub fn old_file(&self, relative: &str) -> PathBuf {
        write_file(
            &self.scan_dir().join(relative),
            SystemTime::now() - Duration::from_secs(3600),
        )
    }
}

/// Writes a file and pins its mtime, since filesystem timestamps can lag the
/// system clock by a tick.
pub fn write_file(path: &Path, modified: SystemTime) -> PathBuf {
    fs::create_dir_all(path.parent().expect("path has a parent")).expect("Failed to create dirs");
    let mut file = File::create(path).expect("Failed to create file");
    file.write_all(b"not really audio").expect("Failed to write file");
    file.set_modified(modified).expect("Failed to set mtime");
    path.to_path_buf()
}

/// Downloader that writes the given files under `scan_dir` and exits with
/// `exit_code`.
pub struct FakeDownloader {
    pub scan_dir: PathBuf,
    pub files: Vec<String>,
    pub lines: Vec<String>,
    pub exit_code: i32,
    pub fail_to_start: bool,
    pub calls: RefCell<Vec<String>>,
}

impl FakeDownloader {
    pub fn new(scan_dir: PathBuf) -> Self {
        Self {
            scan_dir,
            files: Vec::new(),
            lines: Vec::new(),
            exit_code: 0,
            fail_to_start: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn writing(mut self, files: &[&str]) -> Self {
        self.files = files.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn printing(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn exiting_with(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn missing(mut self) -> Self {
        self.fail_to_start = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Downloader for FakeDownloader {
    fn command_line(&self, url: &str) -> String {
        format!("fake-downloader {url}")
    }

    fn download<F>(&self, url: &str, mut on_line: F) -> CoreResult<ToolExit>
    where
        F: FnMut(&str),
    {
        self.calls.borrow_mut().push(url.to_string());
        if self.fail_to_start {
            return Err(CoreError::DependencyNotFound("fake-downloader".to_string()));
        }
        for line in &self.lines {
            on_line(line);
        }
        let written = SystemTime::now() + Duration::from_secs(60);
        for file in &self.files {
            write_file(&self.scan_dir.join(file), written);
        }
        Ok(ToolExit::from_code(self.exit_code))
    }
}

/// Validator that rejects files by name.
#[derive(Default)]
pub struct FakeValidator {
    pub rejected: Vec<String>,
    pub unavailable: bool,
    pub checked: RefCell<Vec<PathBuf>>,
    pub checks: Cell<usize>,
}

impl FakeValidator {
    pub fn accepting_all() -> Self {
        Self::default()
    }

    pub fn rejecting(names: &[&str]) -> Self {
        Self {
            rejected: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn checked_names(&self) -> Vec<String> {
        self.checked
            .borrow()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

impl MediaValidator for FakeValidator {
    fn check(&self, path: &Path) -> CoreResult<Verdict> {
        self.checks.set(self.checks.get() + 1);
        if self.unavailable {
            return Err(CoreError::DependencyNotFound("ffmpeg".to_string()));
        }
        self.checked.borrow_mut().push(path.to_path_buf());
        let name = path.file_name().unwrap().to_string_lossy();
        if self.rejected.iter().any(|r| *r == name) {
            Ok(Verdict::Corrupted {
                reason: format!("{name}: Invalid data found when processing input"),
            })
        } else {
            Ok(Verdict::Valid)
        }
    }
}

/// Records every event for later inspection.
#[derive(Default)]
pub struct EventRecorder {
    pub events: Mutex<Vec<Event>>,
}

impl EventRecorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn stages(&self) -> Vec<dlguard_core::Stage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::StageEntered { stage } => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl EventHandler for EventRecorder {
    fn handle(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}
