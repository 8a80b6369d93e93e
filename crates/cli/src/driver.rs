use std::fmt;
use std::io;
use std::path::Path;

use engine::{EngineError, InstallState, Stage};
use journal::{Journal, JournalError};
use tracing::{debug, error, info, warn};

use crate::exit_code::ExitCode;

/// Runs a fresh install transaction of `source` into `dest`.
///
/// The journal is persisted before the first destructive action and
/// re-persisted after backup so that crash recovery sees correct
/// `existed` flags. A stage failure takes the recovery path the state
/// machine prescribes for that stage: cleanup only after a copy failure,
/// revert then cleanup after a backup failure, no rollback once the
/// commit point has passed. The journal survives whenever recovery
/// leaves anything to finish by hand or via [`resume`].
pub fn install(source: &Path, dest: &Path, journal_path: &Path, keep_journal: bool) -> ExitCode {
    let mut journal = match Journal::new(source, dest) {
        Ok(journal) => journal,
        Err(err) => return fail(&err),
    };

    // Scan failures leave nothing behind: no journal on disk, the
    // destination untouched.
    if let Err(err) = journal.scan_files() {
        return fail(&err);
    }
    info!(files = journal.files().len(), "source tree scanned");

    if let Err(err) = journal.save(journal_path) {
        return fail(&err);
    }
    debug!(state = %InstallState::Scanned, journal = %journal_path.display(), "transaction open");

    match run_stages(&mut journal, journal_path) {
        Ok(()) => finish(journal_path, keep_journal),
        Err(err) => {
            error!(error = %err, "install failed");
            recover(&journal, journal_path, &err)
        }
    }
}

/// Rolls an interrupted transaction forward from its persisted journal.
pub fn resume(journal_path: &Path) -> ExitCode {
    let mut journal = match Journal::load(journal_path) {
        Ok(journal) => journal,
        Err(err) => return fail(&err),
    };
    info!(files = journal.files().len(), "journal loaded, resuming");

    match run_stages(&mut journal, journal_path) {
        Ok(()) => finish(journal_path, false),
        Err(err) => {
            error!(error = %err, "resume failed");
            recover(&journal, journal_path, &err)
        }
    }
}

/// Rolls an interrupted transaction back from its persisted journal.
pub fn revert(journal_path: &Path) -> ExitCode {
    let journal = match Journal::load(journal_path) {
        Ok(journal) => journal,
        Err(err) => return fail(&err),
    };
    info!(files = journal.files().len(), "journal loaded, reverting");

    match engine::revert(&journal).and_then(|()| engine::cleanup(&journal)) {
        Ok(()) => {
            info!("destination restored to pre-install state");
            remove_journal(journal_path);
            ExitCode::Ok
        }
        Err(err) => {
            error!(error = %err, "revert failed, keeping journal for manual recovery");
            fail(&err)
        }
    }
}

/// The stage sequence shared by install and resume. Every stage is
/// re-entrant, so re-running the whole sequence is how a transaction
/// rolls forward.
fn run_stages(journal: &mut Journal, journal_path: &Path) -> Result<(), DriverError> {
    engine::copy_files(journal)?;
    debug!(state = %InstallState::Copied, "stage complete");

    engine::backup_files(journal)?;
    journal.save(journal_path)?;
    debug!(state = %InstallState::BackedUp, "stage complete, journal re-persisted");

    engine::replace(journal)?;
    debug!(state = %InstallState::Replaced, "stage complete");

    engine::cleanup(journal)?;
    debug!(state = %InstallState::Cleaned, "stage complete");

    Ok(())
}

fn finish(journal_path: &Path, keep_journal: bool) -> ExitCode {
    if keep_journal {
        info!(journal = %journal_path.display(), "install complete, journal kept");
    } else {
        remove_journal(journal_path);
        info!("install complete");
    }
    ExitCode::Ok
}

/// Applies the recovery the state machine prescribes for the failed
/// stage.
///
/// A copy failure has determined no `existed` flags yet: every record
/// still carries the default `false`, and a full revert would read that
/// as "unlink the live file", destroying destination content that was
/// never backed up. Dropping the staged siblings is the entire rollback.
///
/// Once replace has started, the commit point is behind us and the
/// backups may already be stale; rolling back would clobber committed
/// content, so the transaction is kept open to roll forward via
/// `resume` instead.
///
/// Backup failures, and a failed journal re-persistence right after
/// backup, sit between those: the in-memory `existed` flags are
/// accurate, so a full revert-then-cleanup is the correct rollback.
fn recover(journal: &Journal, journal_path: &Path, failure: &DriverError) -> ExitCode {
    match failure.failed_stage() {
        Some(Stage::Copy) => match engine::cleanup(journal) {
            Ok(()) => {
                warn!("staged payloads removed, destination untouched");
                remove_journal(journal_path);
                ExitCode::Reverted
            }
            Err(err) => {
                error!(error = %err, "cleanup failed, keeping journal for manual recovery");
                ExitCode::FileIo
            }
        },
        Some(Stage::Replace | Stage::Cleanup) => {
            error!(
                journal = %journal_path.display(),
                "failed past the commit point, not rolling back; re-run with `resume`"
            );
            ExitCode::FileIo
        }
        _ => match engine::revert(journal).and_then(|()| engine::cleanup(journal)) {
            Ok(()) => {
                warn!("destination restored to pre-install state");
                remove_journal(journal_path);
                ExitCode::Reverted
            }
            Err(err) => {
                error!(error = %err, "rollback failed, keeping journal for manual recovery");
                ExitCode::FileIo
            }
        },
    }
}

fn remove_journal(journal_path: &Path) {
    match std::fs::remove_file(journal_path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            warn!(journal = %journal_path.display(), error = %err, "could not remove journal");
        }
    }
}

fn fail<'e, E>(err: &'e E) -> ExitCode
where
    E: fmt::Display,
    ExitCode: From<&'e E>,
{
    let code = ExitCode::from(err);
    error!(error = %err, "{}", code.description());
    code
}

/// A stage-sequence failure: either an engine stage aborted or the
/// post-backup journal re-persistence failed.
#[derive(Debug)]
enum DriverError {
    Engine(EngineError),
    Journal(JournalError),
}

impl DriverError {
    /// The engine stage that aborted, `None` for the journal
    /// re-persistence between backup and replace.
    fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Engine(err) => Some(err.stage()),
            Self::Journal(_) => None,
        }
    }
}

impl From<EngineError> for DriverError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<JournalError> for DriverError {
    fn from(err: JournalError) -> Self {
        Self::Journal(err)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(err) => err.fmt(f),
            Self::Journal(err) => err.fmt(f),
        }
    }
}
