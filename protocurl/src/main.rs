//! # Protocurl CLI Entry Point
//!
//! The main executable for protocurl. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the
//!    log subscriber.
//! 2. **Execution**: Delegates the whole request to [`protocurl_core::workflow::run`].
//! 3. **Presentation**: Progress and the decoded response are printed by the
//!    [`formatter::ConsoleReporter`]; any error is printed to standard error, exiting with 1.
mod cli;
mod formatter;

use clap::Parser;
use cli::{Cli, OutputSettings};
use formatter::{ConsoleReporter, FormattedString};
use protocurl_core::{locator::ExecutableLocator, workflow};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Cli::parse();

    let (spec, output) = match args.into_spec() {
        Ok(parts) => parts,
        Err(err) => exit_with(err.into()),
    };

    init_tracing(output);

    let locator = ExecutableLocator::new();
    let reporter = ConsoleReporter::new(output);

    if let Err(err) = workflow::run(&spec, &locator, &reporter).await {
        exit_with(err);
    }
}

fn exit_with(err: protocurl_core::Error) -> ! {
    eprintln!("{}", FormattedString::from(err));
    process::exit(1);
}

// `RUST_LOG` takes precedence over the verbosity flags.
fn init_tracing(output: OutputSettings) {
    let default_level = if output.quiet {
        "error"
    } else if output.verbose {
        "debug"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
