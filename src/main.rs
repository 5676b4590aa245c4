//! # tablescope command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize logging (file + stderr, or stderr only)
//!   ├─> Create Tokio runtime
//!   └─> Run the pipeline and print the results
//! ```
//!
//! ```bash
//! tablescope sales.csv -o report --no-ai
//! ```
//!
//! Exits with status 0 on success and 1 with a message on stderr when the
//! input cannot be loaded or the report cannot be written.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)] // The binary talks to the terminal

mod cli;

use clap::Parser as _;
use std::process::ExitCode;
use tablescope::logging;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    if let Err(e) = logging::init(cli.log_dir.as_deref()) {
        // Logging to a file is optional; the run is not
        if logging::init_console().is_ok() {
            tracing::warn!("File logging unavailable: {e:#}");
        }
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cli::run(&cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Run failed: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
