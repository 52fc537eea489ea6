// dlguard-cli/src/lib.rs
//
// Library portion of the dlguard CLI application.
// Contains argument definitions, logging setup and command logic.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, RunArgs, SettleMode};
pub use commands::run::{build_config, run_pipeline};
