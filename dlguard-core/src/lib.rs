//! Core library for a download controller that validates what it downloads.
//!
//! A run reads a task descriptor, hands its URL to an external downloader,
//! finds the media files that appeared while it ran, and decodes each one in
//! strict mode, deleting any file that fails.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use dlguard_core::{Controller, ControllerConfig, EventDispatcher};
//! use std::path::PathBuf;
//!
//! let config = ControllerConfig::new(PathBuf::from("/srv/amdl/controller"));
//! let controller = Controller::from_config(config, EventDispatcher::new());
//!
//! let outcome = controller.run();
//! std::process::exit(outcome.exit_code());
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod external;
pub mod outcome;
pub mod pipeline;
pub mod settle;
pub mod task;
pub mod validation;

// Re-exports for public API
pub use config::{ControllerConfig, ControllerConfigBuilder, SettlePolicy};
pub use discovery::{FileStamp, find_new_media_files, snapshot_media_files};
pub use error::{CoreError, CoreResult};
pub use events::{Event, EventDispatcher, EventHandler, JsonEventHandler};
pub use external::{
    CommandDownloader, Downloader, FfmpegValidator, MediaValidator, ToolExit, Verdict,
};
pub use outcome::{OutcomeKind, OutcomeRecord, RunOutcome};
pub use pipeline::{Controller, Stage};
pub use settle::{SettleResult, wait_for_settle};
pub use task::{TaskDescriptor, TaskLoad, load_task};
pub use validation::{FileCheck, Removal, ValidationReport, validate_files};
