use std::ffi::{OsStr, OsString};
use std::path::Path;

use checksums::ContentDigest;
use fsops::{FileKind, FileMeta, FsError};

use crate::error::JournalError;

/// One participating path of the transaction.
///
/// `digest` and `mtime` are meaningful for regular files only; directory
/// records carry [`ContentDigest::ZERO`] and an mtime of zero. `existed`
/// starts out false and is set by the backup stage iff a destination
/// counterpart was successfully backed up.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileRecord {
    path: OsString,
    kind: FileKind,
    digest: ContentDigest,
    mtime: i64,
    existed: bool,
}

impl FileRecord {
    /// Builds a record for the source node at `full_path`, identified by
    /// `rel_path` within the tree.
    ///
    /// Regular files are streamed through the content digest; anything
    /// that is neither a regular file nor a directory aborts the scan.
    pub(crate) fn from_source(rel_path: &OsStr, full_path: &Path) -> Result<Self, JournalError> {
        let meta = FileMeta::lstat(full_path)?;

        let (digest, mtime) = match meta.kind() {
            FileKind::Regular => {
                let digest = checksums::digest_file(full_path)
                    .map_err(|e| FsError::from_io("read", full_path, &e))?;
                (digest, meta.mtime())
            }
            FileKind::Directory => (ContentDigest::ZERO, 0),
        };

        Ok(Self {
            path: rel_path.to_os_string(),
            kind: meta.kind(),
            digest,
            mtime,
            existed: false,
        })
    }

    pub(crate) fn from_parts(
        path: OsString,
        kind: FileKind,
        digest: ContentDigest,
        mtime: i64,
        existed: bool,
    ) -> Self {
        Self {
            path,
            kind,
            digest,
            mtime,
            existed,
        }
    }

    /// Relative path within the tree, always beginning with `/`.
    #[must_use]
    pub fn path(&self) -> &OsStr {
        &self.path
    }

    /// Node kind.
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Content fingerprint of the source bytes at scan time.
    #[must_use]
    pub fn digest(&self) -> ContentDigest {
        self.digest
    }

    /// Source last-modification time, seconds since the epoch.
    #[must_use]
    pub fn mtime(&self) -> i64 {
        self.mtime
    }

    /// Whether a destination counterpart was backed up from this path.
    #[must_use]
    pub fn existed(&self) -> bool {
        self.existed
    }

    /// Records that the backup stage preserved a prior file at this path.
    pub fn set_existed(&mut self, existed: bool) {
        self.existed = existed;
    }
}
