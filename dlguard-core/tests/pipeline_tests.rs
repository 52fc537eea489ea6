// dlguard-core/tests/pipeline_tests.rs

mod common;

use common::{EventRecorder, FakeDownloader, FakeValidator, Layout};
use dlguard_core::{
    Controller, ControllerConfig, Event, EventDispatcher, OutcomeKind, RunOutcome, Stage,
};
use std::fs;
use std::sync::Arc;

const TASK: &str = r#"{"album_url": "https://example/a", "album_name": "Test"}"#;

fn run(
    config: ControllerConfig,
    downloader: &FakeDownloader,
    validator: &FakeValidator,
) -> (RunOutcome, Arc<EventRecorder>) {
    let recorder = Arc::new(EventRecorder::default());
    let mut events = EventDispatcher::new();
    events.add_handler(recorder.clone());
    let outcome = Controller::new(config, downloader, validator, events).run();
    (outcome, recorder)
}

#[test]
fn test_absent_task_is_idle_success() {
    let layout = Layout::new();
    let downloader = FakeDownloader::new(layout.scan_dir()).writing(&["x.flac"]);
    let validator = FakeValidator::accepting_all();

    let (outcome, recorder) = run(layout.config(), &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::NoTask);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(downloader.call_count(), 0);
    assert_eq!(validator.checks.get(), 0);
    assert_eq!(recorder.stages(), vec![Stage::Idle]);
    assert!(matches!(
        recorder.events().last(),
        Some(Event::Finished { record }) if record.outcome == OutcomeKind::NoTask
    ));
}

#[test]
fn test_two_idle_runs_leave_no_trace() {
    let layout = Layout::new();
    let listing = || {
        let mut paths: Vec<_> = fs::read_dir(layout.root.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        paths.sort();
        paths
    };
    let before = listing();

    for _ in 0..2 {
        let downloader = FakeDownloader::new(layout.scan_dir());
        let (outcome, _) = run(layout.config(), &downloader, &FakeValidator::accepting_all());
        assert_eq!(outcome.exit_code(), 0);
    }

    assert_eq!(before, listing());
    assert!(!layout.scan_dir().exists());
}

#[test]
fn test_task_without_url_fails_before_download() {
    let layout = Layout::new();
    layout.write_task(r#"{"album_name": "Test"}"#);
    let downloader = FakeDownloader::new(layout.scan_dir());
    let validator = FakeValidator::accepting_all();

    let (outcome, recorder) = run(layout.config(), &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::TaskInvalid);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(downloader.call_count(), 0);
    assert!(
        recorder
            .events()
            .iter()
            .any(|e| matches!(e, Event::TaskRejected { message } if message.contains("album_url")))
    );
}

#[test]
fn test_malformed_task_fails() {
    let layout = Layout::new();
    layout.write_task("{ this is not json");
    let downloader = FakeDownloader::new(layout.scan_dir());

    let (outcome, _) = run(layout.config(), &downloader, &FakeValidator::accepting_all());

    assert_eq!(outcome.kind(), OutcomeKind::TaskInvalid);
    assert_eq!(downloader.call_count(), 0);
}

#[test]
fn test_downloader_failure_skips_scan_and_validation() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let downloader = FakeDownloader::new(layout.scan_dir())
        .writing(&["partial.flac"])
        .exiting_with(2);
    let validator = FakeValidator::accepting_all();

    let (outcome, recorder) = run(layout.config(), &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::DownloadFailed);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.record().downloader_exit_code, Some(2));
    assert_eq!(downloader.calls.borrow().as_slice(), ["https://example/a"]);
    assert_eq!(validator.checks.get(), 0);
    assert!(layout.scan_dir().join("partial.flac").exists());
    assert_eq!(
        recorder.stages(),
        vec![
            Stage::Idle,
            Stage::TaskLoaded,
            Stage::Downloading,
            Stage::DownloadFailed
        ]
    );
    assert!(
        !recorder
            .events()
            .iter()
            .any(|e| matches!(e, Event::ScanStarted { .. }))
    );
}

#[test]
fn test_downloader_that_cannot_start_is_a_download_failure() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let downloader = FakeDownloader::new(layout.scan_dir()).missing();

    let (outcome, recorder) = run(layout.config(), &downloader, &FakeValidator::accepting_all());

    assert_eq!(outcome.kind(), OutcomeKind::DownloadFailed);
    assert_eq!(outcome.record().downloader_exit_code, None);
    assert!(
        recorder
            .events()
            .iter()
            .any(|e| matches!(e, Event::DownloadFailed { message } if message.contains("fake-downloader")))
    );
}

#[test]
fn test_downloader_output_is_forwarded_unfiltered() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let downloader = FakeDownloader::new(layout.scan_dir()).printing(&[
        "Downloading track 1",
        " 45% 3.2 MB/s",
        "",
        "Done",
    ]);

    let (_, recorder) = run(layout.config(), &downloader, &FakeValidator::accepting_all());

    let lines: Vec<String> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::DownloaderOutput { line } => Some(line),
            _ => None,
        })
        .collect();
    assert_eq!(lines, vec!["Downloading track 1", " 45% 3.2 MB/s", "", "Done"]);
}

#[test]
fn test_empty_candidate_set_is_vacuous_success() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let downloader = FakeDownloader::new(layout.scan_dir());
    let validator = FakeValidator::accepting_all();

    let (outcome, recorder) = run(layout.config(), &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::Success);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(validator.checks.get(), 0);
    assert_eq!(
        recorder.stages(),
        vec![
            Stage::Idle,
            Stage::TaskLoaded,
            Stage::Downloading,
            Stage::Downloaded,
            Stage::Settling,
            Stage::Scanning,
            Stage::Validating,
            Stage::ValidationPassed
        ]
    );
}

#[test]
fn test_files_older_than_the_run_are_ignored() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let old = layout.old_file("Earlier Album/01.flac");
    let downloader = FakeDownloader::new(layout.scan_dir());
    let validator = FakeValidator::rejecting(&["01.flac"]);

    let (outcome, _) = run(layout.config(), &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::Success);
    assert_eq!(validator.checks.get(), 0);
    assert!(old.exists());
}

#[test]
fn test_scan_failure_falls_back_to_vacuous_success() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let mut config = layout.config();
    config.scan_dir = layout.root.path().join("downloads.flac");
    fs::write(&config.scan_dir, b"not a directory").unwrap();
    let downloader = FakeDownloader::new(layout.scan_dir());
    let validator = FakeValidator::accepting_all();

    let (outcome, recorder) = run(config, &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::Success);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(validator.checks.get(), 0);

    let events = recorder.events();
    assert!(events.iter().any(|e| matches!(e, Event::ScanFailed { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::ScanComplete { files } if files.is_empty())));
    assert_eq!(
        recorder.stages(),
        vec![
            Stage::Idle,
            Stage::TaskLoaded,
            Stage::Downloading,
            Stage::Downloaded,
            Stage::Settling,
            Stage::Scanning,
            Stage::Validating,
            Stage::ValidationPassed
        ]
    );
}

#[test]
fn test_accepted_file_is_kept() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let downloader = FakeDownloader::new(layout.scan_dir()).writing(&["Test/x.flac", "Test/cover.jpg"]);
    let validator = FakeValidator::accepting_all();

    let (outcome, _) = run(layout.config(), &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::Success);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(validator.checked_names(), vec!["x.flac"]);
    assert!(layout.scan_dir().join("Test/x.flac").exists());

    let record = outcome.record();
    assert_eq!(record.album_name.as_deref(), Some("Test"));
    assert_eq!(record.files_checked, 1);
    assert!(record.corrupted_files.is_empty());
}

#[test]
fn test_rejected_file_is_deleted_and_others_still_checked() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let downloader =
        FakeDownloader::new(layout.scan_dir()).writing(&["Test/a.flac", "Test/y.m4a", "Test/z.m4a"]);
    let validator = FakeValidator::rejecting(&["y.m4a"]);

    let (outcome, recorder) = run(layout.config(), &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::ValidationFailed);
    assert_eq!(outcome.exit_code(), 1);
    // m4a ranks before flac in the default allow-list
    assert_eq!(validator.checked_names(), vec!["y.m4a", "z.m4a", "a.flac"]);
    assert!(!layout.scan_dir().join("Test/y.m4a").exists());
    assert!(layout.scan_dir().join("Test/z.m4a").exists());
    assert!(layout.scan_dir().join("Test/a.flac").exists());
    assert_eq!(
        outcome.record().corrupted_files,
        vec![layout.scan_dir().join("Test/y.m4a")]
    );
    assert!(
        recorder
            .events()
            .iter()
            .any(|e| matches!(e, Event::FileRemoved { path } if path.ends_with("y.m4a")))
    );
    assert_eq!(recorder.stages().last(), Some(&Stage::ValidationFailed));
}

#[test]
fn test_unavailable_validator_fails_without_deleting() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let downloader = FakeDownloader::new(layout.scan_dir()).writing(&["a.flac", "b.flac"]);
    let validator = FakeValidator::unavailable();

    let (outcome, _) = run(layout.config(), &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::ValidationFailed);
    assert_eq!(validator.checks.get(), 1);
    assert!(layout.scan_dir().join("a.flac").exists());
    assert!(layout.scan_dir().join("b.flac").exists());
}

#[test]
fn test_placeholder_album_name() {
    let layout = Layout::new();
    layout.write_task(r#"{"album_url": "https://example/b"}"#);
    let downloader = FakeDownloader::new(layout.scan_dir());

    let (outcome, recorder) = run(layout.config(), &downloader, &FakeValidator::accepting_all());

    assert_eq!(outcome.record().album_name.as_deref(), Some("Unknown Album"));
    assert!(recorder.events().iter().any(|e| matches!(
        e,
        Event::TaskLoaded { album_name, .. } if album_name == "Unknown Album"
    )));
}

#[test]
fn test_invalid_config_is_an_error_outcome() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let mut config = layout.config();
    config.media_extensions.clear();
    let downloader = FakeDownloader::new(layout.scan_dir());

    let (outcome, _) = run(config, &downloader, &FakeValidator::accepting_all());

    assert_eq!(outcome.kind(), OutcomeKind::Error);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(downloader.call_count(), 0);
}

#[test]
fn test_finished_is_the_last_event() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let downloader = FakeDownloader::new(layout.scan_dir()).writing(&["x.flac"]);

    let (_, recorder) = run(layout.config(), &downloader, &FakeValidator::accepting_all());

    let events = recorder.events();
    let finished = events
        .iter()
        .filter(|e| matches!(e, Event::Finished { .. }))
        .count();
    assert_eq!(finished, 1);
    assert!(matches!(events.last(), Some(Event::Finished { .. })));
}

#[test]
fn test_poll_until_stable_settles_before_scan() {
    let layout = Layout::new();
    layout.write_task(TASK);
    let mut config = layout.config();
    config.settle = dlguard_core::SettlePolicy::UntilStable {
        interval: std::time::Duration::from_millis(5),
        timeout: std::time::Duration::from_secs(5),
    };
    let downloader = FakeDownloader::new(layout.scan_dir()).writing(&["x.flac"]);
    let validator = FakeValidator::accepting_all();

    let (outcome, recorder) = run(config, &downloader, &validator);

    assert_eq!(outcome.kind(), OutcomeKind::Success);
    assert_eq!(validator.checks.get(), 1);
    assert!(recorder.events().iter().any(|e| matches!(
        e,
        Event::Settled {
            result: dlguard_core::SettleResult::Stable { .. }
        }
    )));
}

#[cfg(unix)]
#[test]
fn test_real_commands_from_config() {
    let layout = Layout::new();
    layout.write_task(TASK);
    // Sleep so the new file's mtime is clearly after the run starts.
    let script = "sleep 0.2; mkdir -p 'AM-DL downloads/Test' && echo data > 'AM-DL downloads/Test/x.flac'";
    let config = dlguard_core::ControllerConfigBuilder::new()
        .work_dir(layout.work_dir())
        .downloader("sh", ["-c", script, "sh"])
        .validator_program("false")
        .settle(dlguard_core::SettlePolicy::None)
        .build();

    let outcome = Controller::from_config(config, EventDispatcher::new()).run();

    assert_eq!(outcome.kind(), OutcomeKind::ValidationFailed);
    assert!(!layout.scan_dir().join("Test/x.flac").exists());
}
