use fsops::FileKind;
use journal::{Journal, PathComposer};
use tracing::{debug, trace, warn};

use crate::error::{EngineError, Stage};

/// Stage 1: materialize directories and stage new payloads.
///
/// Directories are created (or, when already present, have their metadata
/// refreshed from the source) in list order, so parents exist before their
/// contents. Regular files are staged as `new_prefix` siblings of their
/// final names via hardlink-or-copy; nothing the destination serves under
/// its final names changes yet.
///
/// Re-running after a partial pass converges: existing directories take
/// the metadata-refresh branch and existing staged files are accepted or
/// replaced by [`fsops::link_or_copy`].
pub fn copy_files(journal: &Journal) -> Result<(), EngineError> {
    debug!(files = journal.files().len(), "copy stage starting");

    let mut source = PathComposer::new(journal.source_root());
    let mut dest = PathComposer::new(journal.dest_root());
    let mut staged = PathComposer::with_prefix(journal.dest_root(), journal.new_prefix());

    for record in journal.files() {
        match record.kind() {
            FileKind::Directory => {
                source.set_directory(record.path());
                dest.set_directory(record.path());

                match fsops::copy(source.as_path(), dest.as_path()) {
                    Ok(()) => {}
                    Err(e) if e.is_already_exists() => {
                        trace!(path = %dest.as_path().display(), "directory present, refreshing metadata");
                        fsops::copy_metadata(source.as_path(), dest.as_path())
                            .map_err(|e| EngineError::new(Stage::Copy, e))?;
                    }
                    Err(e) => return Err(EngineError::new(Stage::Copy, e)),
                }
            }
            FileKind::Regular => {
                source.set_path(record.path());
                staged.set_path(record.path());

                match fsops::link_or_copy(source.as_path(), staged.as_path()) {
                    Ok(()) => trace!(path = %staged.as_path().display(), "staged"),
                    Err(e) if e.is_not_found() || e.is_already_exists() => {
                        warn!(path = %source.as_path().display(), error = %e, "skipping payload");
                    }
                    Err(e) => return Err(EngineError::new(Stage::Copy, e)),
                }
            }
        }
    }

    Ok(())
}

/// Stage 2: preserve prior content.
///
/// Each regular record's live destination file is hardlinked (or copied)
/// to its `backup_prefix` sibling and the record's `existed` flag is set.
/// A missing live file simply leaves `existed` false: that path had no
/// prior content and revert will unlink rather than restore it.
///
/// The caller is expected to re-persist the journal after this stage, so
/// a crash before the commit still knows which files to restore.
pub fn backup_files(journal: &mut Journal) -> Result<(), EngineError> {
    debug!(files = journal.files().len(), "backup stage starting");

    let dest_root = journal.dest_root().to_path_buf();
    let backup_prefix = journal.backup_prefix().to_os_string();
    let mut live = PathComposer::new(&dest_root);
    let mut backup = PathComposer::with_prefix(&dest_root, &backup_prefix);

    for record in journal.files_mut() {
        if record.kind() != FileKind::Regular {
            continue;
        }

        live.set_path(record.path());
        backup.set_path(record.path());

        match fsops::link_or_copy(live.as_path(), backup.as_path()) {
            Ok(()) => {
                trace!(path = %live.as_path().display(), "backed up");
                record.set_existed(true);
            }
            Err(e) if e.is_not_found() => {
                trace!(path = %live.as_path().display(), "no prior file");
            }
            Err(e) => return Err(EngineError::new(Stage::Backup, e)),
        }
    }

    Ok(())
}

/// Stage 3: the commit.
///
/// Every staged payload is renamed onto its final name. Each rename is
/// atomic within its directory; the first successful one commits the
/// transaction, after which recovery means rolling the rest forward (by
/// re-running), not undoing what is already visible.
pub fn replace(journal: &Journal) -> Result<(), EngineError> {
    debug!(files = journal.files().len(), "replace stage starting");

    let mut staged = PathComposer::with_prefix(journal.dest_root(), journal.new_prefix());
    let mut live = PathComposer::new(journal.dest_root());

    for record in journal.files() {
        if record.kind() != FileKind::Regular {
            continue;
        }

        staged.set_path(record.path());
        live.set_path(record.path());

        fsops::move_file(staged.as_path(), live.as_path())
            .map_err(|e| EngineError::new(Stage::Replace, e))?;
        trace!(path = %live.as_path().display(), "replaced");
    }

    Ok(())
}

/// Stage 4: drop staged and backup siblings.
///
/// Unconditionally idempotent: missing siblings are ignored, and
/// directories are never removed since the new tree subsumes the old
/// one's directory structure.
pub fn cleanup(journal: &Journal) -> Result<(), EngineError> {
    debug!(files = journal.files().len(), "cleanup stage starting");

    let mut staged = PathComposer::with_prefix(journal.dest_root(), journal.new_prefix());
    let mut backup = PathComposer::with_prefix(journal.dest_root(), journal.backup_prefix());

    for record in journal.files() {
        if record.kind() != FileKind::Regular {
            continue;
        }

        staged.set_path(record.path());
        backup.set_path(record.path());

        for path in [staged.as_path(), backup.as_path()] {
            match fsops::unlink(path) {
                Ok(()) => trace!(path = %path.display(), "removed"),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(EngineError::new(Stage::Cleanup, e)),
            }
        }
    }

    Ok(())
}

/// Rolls the destination back to its pre-install state.
///
/// Backed-up files move back onto their final names; files that had no
/// prior content are unlinked. Both directions tolerate `ENOENT`, so a
/// second revert over the same journal is a no-op. The caller still runs
/// [`cleanup`] afterwards to drop leftover staged payloads.
pub fn revert(journal: &Journal) -> Result<(), EngineError> {
    debug!(files = journal.files().len(), "reverting");

    let mut live = PathComposer::new(journal.dest_root());
    let mut backup = PathComposer::with_prefix(journal.dest_root(), journal.backup_prefix());

    for record in journal.files() {
        if record.kind() != FileKind::Regular {
            continue;
        }

        live.set_path(record.path());
        backup.set_path(record.path());

        if record.existed() {
            match fsops::move_file(backup.as_path(), live.as_path()) {
                Ok(()) => trace!(path = %live.as_path().display(), "restored"),
                Err(e) if e.is_not_found() => {
                    trace!(path = %live.as_path().display(), "already restored");
                }
                Err(e) => return Err(EngineError::new(Stage::Revert, e)),
            }
        } else {
            match fsops::unlink(live.as_path()) {
                Ok(()) => trace!(path = %live.as_path().display(), "unlinked"),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(EngineError::new(Stage::Revert, e)),
            }
        }
    }

    Ok(())
}
