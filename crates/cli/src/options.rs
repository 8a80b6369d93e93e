use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(
    name = "atomic-install",
    version,
    about = "Atomically install a prepared directory tree into a live destination"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// The requested operation.
    #[command(subcommand)]
    pub command: Command,
}

/// The operations the frontend exposes.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install SOURCE into DEST, journaled and atomic per file.
    Install {
        /// Fully-prepared source tree.
        source: PathBuf,
        /// Live destination tree.
        dest: PathBuf,
        /// Where to persist the transaction journal
        /// (default: `<DEST>.AIj`).
        #[arg(long)]
        journal: Option<PathBuf>,
        /// Keep the journal file after a successful install.
        #[arg(long)]
        keep_journal: bool,
    },
    /// Re-run the stages of an interrupted install from its journal.
    ///
    /// Every stage is re-entrant, so this rolls the transaction forward
    /// no matter where the previous run stopped.
    Resume {
        /// Journal persisted by the interrupted run.
        journal: PathBuf,
    },
    /// Restore the pre-install state recorded in a journal.
    Revert {
        /// Journal persisted by the run to roll back.
        journal: PathBuf,
    },
}

/// Default journal location: a sibling of the destination root, outside
/// the installed tree.
pub(crate) fn default_journal_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".AIj");
    PathBuf::from(name)
}
