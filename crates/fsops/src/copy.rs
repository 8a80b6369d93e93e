use std::fs::{File, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use filetime::FileTime;
use rustix::fs::Mode;
use rustix::io::Errno;
use tracing::warn;

use crate::error::FsError;
use crate::meta::{FileKind, FileMeta};

/// Renames `src` onto `dst`.
///
/// Within a single directory this is the atomic commit primitive: readers
/// opening `dst` observe either the old or the new inode, never a mix.
pub fn move_file(src: &Path, dst: &Path) -> Result<(), FsError> {
    rustix::fs::rename(src, dst).map_err(|errno| FsError::io("rename", src, errno))
}

/// Removes `path`, surfacing the underlying errno.
pub fn unlink(path: &Path) -> Result<(), FsError> {
    rustix::fs::unlink(path).map_err(|errno| FsError::io("unlink", path, errno))
}

/// Hardlinks `src` to `dst`, falling back to a metadata-preserving byte
/// copy when the paths are on different filesystems or the filesystem does
/// not support hardlinks.
///
/// A destination that already exists as a hardlink of `src` counts as
/// success; any other pre-existing destination is replaced. This makes
/// repeated staging runs converge instead of failing halfway.
pub fn link_or_copy(src: &Path, dst: &Path) -> Result<(), FsError> {
    match try_link(src, dst) {
        Ok(()) => Ok(()),
        Err(Errno::EXIST) => {
            if same_inode(src, dst)? {
                return Ok(());
            }
            unlink(dst)?;
            match try_link(src, dst) {
                Ok(()) => Ok(()),
                Err(errno) if link_unsupported(errno) => copy_contents(src, dst),
                Err(errno) => Err(FsError::io("link", src, errno)),
            }
        }
        Err(errno) if link_unsupported(errno) => copy_contents(src, dst),
        Err(errno) => Err(FsError::io("link", src, errno)),
    }
}

/// Creates `dst` as a copy of `src`.
///
/// Directories are created with `mkdir`; an `EEXIST` from the filesystem
/// surfaces to the caller, which may choose to refresh the metadata of the
/// existing directory instead. Regular files are byte-copied. In both
/// cases ownership, permission bits and timestamps are carried over where
/// permitted.
pub fn copy(src: &Path, dst: &Path) -> Result<(), FsError> {
    let meta = FileMeta::lstat(src)?;

    match meta.kind() {
        FileKind::Directory => {
            rustix::fs::mkdir(dst, Mode::from_bits_truncate(meta.mode()))
                .map_err(|errno| FsError::io("mkdir", dst, errno))?;
            apply_metadata(&meta, dst)
        }
        FileKind::Regular => {
            write_contents(src, dst)?;
            apply_metadata(&meta, dst)
        }
    }
}

/// Applies the metadata of `src` to an existing `dst`.
pub fn copy_metadata(src: &Path, dst: &Path) -> Result<(), FsError> {
    let meta = FileMeta::lstat(src)?;
    apply_metadata(&meta, dst)
}

fn try_link(src: &Path, dst: &Path) -> Result<(), Errno> {
    rustix::fs::link(src, dst)
}

fn link_unsupported(errno: Errno) -> bool {
    matches!(errno, Errno::XDEV | Errno::PERM | Errno::OPNOTSUPP | Errno::MLINK)
}

/// True when `src` and `dst` name the same inode on the same device.
///
/// A missing `dst` is simply "no".
fn same_inode(src: &Path, dst: &Path) -> Result<bool, FsError> {
    let a = rustix::fs::lstat(src).map_err(|errno| FsError::io("lstat", src, errno))?;
    let b = match rustix::fs::lstat(dst) {
        Ok(st) => st,
        Err(Errno::NOENT) => return Ok(false),
        Err(errno) => return Err(FsError::io("lstat", dst, errno)),
    };
    Ok(a.st_dev == b.st_dev && a.st_ino == b.st_ino)
}

fn copy_contents(src: &Path, dst: &Path) -> Result<(), FsError> {
    let meta = FileMeta::lstat(src)?;
    write_contents(src, dst)?;
    apply_metadata(&meta, dst)
}

fn write_contents(src: &Path, dst: &Path) -> Result<(), FsError> {
    let mut reader = File::open(src).map_err(|e| FsError::from_io("open", src, &e))?;
    let mut writer = File::create(dst).map_err(|e| FsError::from_io("open", dst, &e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| FsError::from_io("copy", dst, &e))?;
    writer
        .sync_all()
        .map_err(|e| FsError::from_io("fsync", dst, &e))?;
    Ok(())
}

fn apply_metadata(meta: &FileMeta, dst: &Path) -> Result<(), FsError> {
    match std::os::unix::fs::chown(dst, Some(meta.uid()), Some(meta.gid())) {
        Ok(()) => {}
        Err(e) if e.raw_os_error() == Some(Errno::PERM.raw_os_error()) => {
            warn!(path = %dst.display(), "not permitted to change ownership, leaving as-is");
        }
        Err(e) => return Err(FsError::from_io("chown", dst, &e)),
    }

    // chmod after chown: a chown may clear setuid/setgid bits.
    std::fs::set_permissions(dst, Permissions::from_mode(meta.mode()))
        .map_err(|e| FsError::from_io("chmod", dst, &e))?;

    let mtime = FileTime::from_unix_time(meta.mtime(), meta.mtime_nsec());
    filetime::set_file_mtime(dst, mtime).map_err(|e| FsError::from_io("utimes", dst, &e))?;

    Ok(())
}
