#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Command-line frontend for atomic-install.
//!
//! Parses the `install` / `resume` / `revert` surface, wires up logging,
//! and drives the engine stages in order, mapping every outcome to a
//! stable exit code. All interesting behavior lives in the library
//! crates; this one sequences it.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod driver;
mod exit_code;
mod options;

pub use driver::{install, resume, revert};
pub use exit_code::ExitCode;
pub use options::{Cli, Command};

/// Parses arguments, runs the requested command, and returns the process
/// exit code.
pub fn run() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::Syntax
            } else {
                ExitCode::Ok
            };
            return code.process();
        }
    };

    init_tracing(cli.verbose);

    let code = match cli.command {
        Command::Install {
            source,
            dest,
            journal,
            keep_journal,
        } => {
            let journal_path = journal.unwrap_or_else(|| options::default_journal_path(&dest));
            install(&source, &dest, &journal_path, keep_journal)
        }
        Command::Resume { journal } => resume(&journal),
        Command::Revert { journal } => revert(&journal),
    };

    code.process()
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` occurrences pick the baseline
/// level.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
