//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `run` command.
/// This command processes the current task descriptor once.
pub mod run;
