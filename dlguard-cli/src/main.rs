// dlguard-cli/src/main.rs
//
// Entry point for the `dlguard` binary.
//
// Responsibilities:
// - Parsing command-line arguments.
// - Setting up console and per-run file logging.
// - Dispatching to the selected command.
// - Exiting with the code of the run outcome (0 success or idle, 1 failure).

use clap::Parser;
use dlguard_cli::logging::init_logging;
use dlguard_cli::{Cli, Commands, run_pipeline};
use log::{debug, error};
use std::process;

fn main() {
    // Usage errors exit 1 like any other failure; clap alone would use 2.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    match init_logging(cli.verbose, cli.log_dir.as_deref(), cli.json) {
        Ok(Some(log_path)) => debug!("Log file: {}", log_path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }

    let result = match cli.command {
        Commands::Run(args) => run_pipeline(args, cli.json),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{e:#}");
            process::exit(1);
        }
    }
}
