use std::fmt;

use thiserror::Error;

/// Phases of the install transaction, as named in failures.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Stage {
    /// Staging new payloads and materializing directories.
    Copy,
    /// Preserving prior content as backup siblings.
    Backup,
    /// Renaming staged payloads onto their final names.
    Replace,
    /// Removing leftover staged and backup siblings.
    Cleanup,
    /// Rolling the destination back to its pre-install state.
    Revert,
}

impl Stage {
    /// Lowercase stage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Backup => "backup",
            Self::Replace => "replace",
            Self::Cleanup => "cleanup",
            Self::Revert => "revert",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage aborted on a filesystem failure it does not absorb.
///
/// The wrapped [`FsError`](fsops::FsError) keeps the operation, path and
/// errno; the engine adds which stage was running, which tells the caller
/// what recovery is appropriate (revert after copy/backup, re-run after
/// replace).
#[derive(Debug, Error)]
#[error("{stage} stage failed")]
pub struct EngineError {
    stage: Stage,
    #[source]
    source: fsops::FsError,
}

impl EngineError {
    pub(crate) fn new(stage: Stage, source: fsops::FsError) -> Self {
        Self { stage, source }
    }

    /// The stage that was executing when the failure surfaced.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The underlying filesystem failure.
    #[must_use]
    pub fn fs_error(&self) -> &fsops::FsError {
        &self.source
    }
}
