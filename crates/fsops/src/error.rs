use std::path::{Path, PathBuf};

use rustix::io::Errno;
use thiserror::Error;

/// Failure raised by the operations in this crate.
///
/// The install stages decide how to react by inspecting [`FsError::errno`]:
/// `ENOENT` during backup means "no prior file", `EEXIST` while creating a
/// destination directory means "refresh its metadata instead". Everything
/// the caller does not recognise aborts the stage.
#[derive(Debug, Error)]
pub enum FsError {
    /// A syscall failed with the contained errno.
    #[error("{op} failed: {}: {errno}", .path.display())]
    Io {
        /// Name of the failing operation, e.g. `"rename"`.
        op: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// The raw OS error.
        errno: Errno,
    },

    /// `lstat` reported a node that is neither a regular file nor a
    /// directory. Symlinks, devices, sockets and fifos are outside the
    /// installer's contract.
    #[error("unknown file type: {}", .path.display())]
    UnknownFileType {
        /// Path of the offending node.
        path: PathBuf,
    },
}

impl FsError {
    /// Wraps a raw errno with operation and path context.
    #[must_use]
    pub fn io(op: &'static str, path: &Path, errno: Errno) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            errno,
        }
    }

    /// Wraps a [`std::io::Error`], recovering the errno where one exists.
    #[must_use]
    pub fn from_io(op: &'static str, path: &Path, err: &std::io::Error) -> Self {
        let errno = err.raw_os_error().map_or(Errno::IO, Errno::from_raw_os_error);
        Self::io(op, path, errno)
    }

    /// The errno behind the failure, if it was a syscall failure.
    #[must_use]
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::Io { errno, .. } => Some(*errno),
            Self::UnknownFileType { .. } => None,
        }
    }

    /// The path the failure is attributed to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::UnknownFileType { path } => path,
        }
    }

    /// True for `ENOENT`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.errno() == Some(Errno::NOENT)
    }

    /// True for `EEXIST`.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.errno() == Some(Errno::EXIST)
    }
}
