//! Implementation of the 'run' subcommand.
//!
//! Builds a `ControllerConfig` from the arguments, wires up the event
//! handlers and runs the pipeline once. The returned value is the process
//! exit code.

use crate::cli::{RunArgs, SettleMode};
use crate::terminal::ConsoleEventHandler;

use dlguard_core::config::DEFAULT_DOWNLOADER_PROGRAM;
use dlguard_core::{
    Controller, ControllerConfig, ControllerConfigBuilder, Event, EventDispatcher, EventHandler,
    JsonEventHandler, RunOutcome, SettlePolicy,
};

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error};

/// Translates CLI arguments into a controller configuration.
pub fn build_config(args: &RunArgs) -> Result<ControllerConfig> {
    let work_dir = args.work_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let work_dir = std::path::absolute(&work_dir)
        .with_context(|| format!("Invalid work directory '{}'", work_dir.display()))?;

    let mut builder = ControllerConfigBuilder::new().work_dir(work_dir);

    if let Some(task_file) = &args.task_file {
        builder = builder.task_file(task_file.clone());
    }
    if let Some(scan_dir) = &args.scan_dir {
        builder = builder.scan_dir(scan_dir.clone());
    }

    // The default `run main.go` arguments only make sense for the default program.
    match &args.downloader {
        Some(program) => builder = builder.downloader(program.clone(), args.downloader_args.clone()),
        None if !args.downloader_args.is_empty() => {
            builder = builder.downloader(DEFAULT_DOWNLOADER_PROGRAM, args.downloader_args.clone())
        }
        None => {}
    }

    if let Some(validator) = &args.validator {
        builder = builder.validator_program(validator.clone());
    }
    if !args.extensions.is_empty() {
        builder = builder.media_extensions(args.extensions.iter().map(|ext| ext.trim_start_matches('.')));
    }

    let interval = Duration::from_millis(args.settle_ms);
    builder = builder.settle(match args.settle {
        SettleMode::Fixed => SettlePolicy::Fixed(interval),
        SettleMode::Stable => SettlePolicy::UntilStable {
            interval,
            timeout: Duration::from_millis(args.settle_timeout_ms),
        },
        SettleMode::None => SettlePolicy::None,
    });

    Ok(builder.build())
}

/// Runs the pipeline once and returns the exit code.
pub fn run_pipeline(args: RunArgs, json: bool) -> Result<i32> {
    let config = build_config(&args)?;
    debug!("Work directory: {}", config.work_dir.display());
    debug!("Task file: {}", config.task_file.display());
    debug!("Scan directory: {}", config.scan_dir.display());

    let mut handlers: Vec<Arc<dyn EventHandler>> = Vec::new();
    if json {
        handlers.push(Arc::new(JsonEventHandler::new()));
        handlers.push(Arc::new(ConsoleEventHandler::with_interactive(false)));
    } else {
        handlers.push(Arc::new(ConsoleEventHandler::new()));
    }

    let mut events = EventDispatcher::new();
    for handler in &handlers {
        events.add_handler(handler.clone());
    }

    let controller = Controller::from_config(config, events);
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| controller.run())) {
        Ok(outcome) => outcome,
        Err(_) => {
            // The controller never reached its final event; report it here.
            let outcome = RunOutcome::Error {
                message: "Internal error: the controller panicked".to_string(),
            };
            let event = Event::Finished {
                record: outcome.record(),
            };
            for handler in &handlers {
                handler.handle(&event);
            }
            outcome
        }
    };

    if let Some(path) = &args.outcome_file {
        if let Err(e) = outcome.record().write_to(path) {
            error!("Failed to write outcome file '{}': {e}", path.display());
            return Ok(dlguard_core::outcome::EXIT_FAILURE);
        }
    }

    Ok(outcome.exit_code())
}
