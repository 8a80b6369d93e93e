use std::ffi::OsString;
use std::fs::ReadDir;
use std::path::{Path, PathBuf};

use rustix::fs::FileType;

use crate::error::FsError;

/// Kind of filesystem node the installer understands.
///
/// The set is deliberately closed: a scan that encounters anything else
/// fails before the transaction touches the destination tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FileKind {
    /// Regular file.
    Regular,
    /// Directory.
    Directory,
}

/// Metadata snapshot of a filesystem node, taken without following symlinks.
#[derive(Clone, Copy, Debug)]
pub struct FileMeta {
    kind: FileKind,
    mode: u32,
    uid: u32,
    gid: u32,
    mtime: i64,
    mtime_nsec: u32,
    size: u64,
}

impl FileMeta {
    /// Takes an `lstat` snapshot of `path`.
    ///
    /// Nodes that are neither regular files nor directories are rejected
    /// with [`FsError::UnknownFileType`].
    pub fn lstat(path: &Path) -> Result<Self, FsError> {
        let st = rustix::fs::lstat(path).map_err(|errno| FsError::io("lstat", path, errno))?;

        let kind = match FileType::from_raw_mode(st.st_mode as u32) {
            FileType::RegularFile => FileKind::Regular,
            FileType::Directory => FileKind::Directory,
            _ => {
                return Err(FsError::UnknownFileType {
                    path: path.to_path_buf(),
                });
            }
        };

        Ok(Self {
            kind,
            mode: (st.st_mode as u32) & 0o7777,
            uid: st.st_uid,
            gid: st.st_gid,
            mtime: st.st_mtime as i64,
            mtime_nsec: st.st_mtime_nsec as u32,
            size: st.st_size as u64,
        })
    }

    /// Node kind.
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Permission bits (including setuid/setgid/sticky).
    #[must_use]
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Owning user id.
    #[must_use]
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Owning group id.
    #[must_use]
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Last-modification time, seconds since the epoch.
    #[must_use]
    pub fn mtime(&self) -> i64 {
        self.mtime
    }

    /// Nanosecond part of the last-modification time.
    #[must_use]
    pub fn mtime_nsec(&self) -> u32 {
        self.mtime_nsec
    }

    /// Size in bytes. Meaningful for regular files only.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// True when the node is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Opens `path` for enumeration.
///
/// The returned iterator owns the directory handle and closes it on every
/// exit path, yielding entry names with `.` and `..` already omitted. The
/// order is whatever the underlying directory stream produces; callers that
/// need determinism sort for themselves.
pub fn read_dir(path: &Path) -> Result<DirIter, FsError> {
    let inner = std::fs::read_dir(path).map_err(|e| FsError::from_io("opendir", path, &e))?;
    Ok(DirIter {
        inner,
        path: path.to_path_buf(),
    })
}

/// Pull-based directory entry iterator returned by [`read_dir`].
#[derive(Debug)]
pub struct DirIter {
    inner: ReadDir,
    path: PathBuf,
}

impl Iterator for DirIter {
    type Item = Result<OsString, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok(entry) => Some(Ok(entry.file_name())),
            Err(e) => Some(Err(FsError::from_io("readdir", &self.path, &e))),
        }
    }
}
