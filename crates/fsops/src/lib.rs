#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! POSIX file operations for the atomic-install workspace.
//!
//! The crate wraps the handful of syscalls the install transaction is built
//! from (`lstat`, directory enumeration, `rename`, `link`, `mkdir`,
//! `unlink`) and the metadata-preserving copy primitives layered on top of
//! them. Every failure surfaces as an [`FsError`] carrying the operation
//! name, the implicated path, and the OS [`Errno`](rustix::io::Errno), so
//! callers can pattern-match the errno and absorb the failures that are part
//! of normal operation (a missing backup source, an already-created
//! directory) while propagating everything else.
//!
//! Symbolic links are never followed and never copied: the installer
//! recognises regular files and directories only, and rejects everything
//! else up front.

mod copy;
mod error;
mod meta;

pub use copy::{copy, copy_metadata, link_or_copy, move_file, unlink};
pub use error::FsError;
pub use meta::{DirIter, FileKind, FileMeta, read_dir};
