#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The transaction journal for atomic directory-tree installation. A
//! [`Journal`] names every file participating in one install transaction:
//! the source and destination roots, the two transaction-unique filename
//! prefixes used to stage payloads and backups beside their final names,
//! and the ordered list of [`FileRecord`]s produced by scanning the source
//! tree.
//!
//! # Design
//!
//! - [`PathComposer`] renders relative paths against a fixed root (and
//!   optional filename salt) by reusing one buffer, so the engine's stages
//!   can walk thousands of records without re-allocating path strings.
//! - [`Journal::scan_files`] walks the source tree breadth-first and
//!   appends records in an order where every directory precedes its
//!   contents.
//! - [`Journal::save`] and [`Journal::load`] persist the journal through a
//!   sibling temp file and an atomic rename, so an interrupted save never
//!   clobbers a valid journal.
//!
//! # Invariants
//!
//! - The record list starts with the root directory `"/"`, and every
//!   non-root record's parent directory appears earlier in the list.
//! - The staged prefixes are generated once per transaction and survive
//!   process restarts because they live inside the persisted journal.
//! - `load(save(j)) == j`, including `existed` flags mutated by the backup
//!   stage.

use std::ffi::{OsStr, OsString};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

mod codec;
mod composer;
mod error;
mod record;
mod scan;

pub use checksums::ContentDigest;
pub use composer::PathComposer;
pub use error::JournalError;
pub use fsops::FileKind;
pub use record::FileRecord;

/// Persistent manifest of one install transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Journal {
    source_root: PathBuf,
    dest_root: PathBuf,
    new_prefix: OsString,
    backup_prefix: OsString,
    files: Vec<FileRecord>,
}

impl Journal {
    /// Creates an empty journal for installing `source` into `dest`.
    ///
    /// The staged-payload and backup prefixes are derived from a fresh
    /// random token, so two incomplete installs over the same destination
    /// remain visually distinguishable and never collide on prefix
    /// strings.
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let token = transaction_token()?;

        Ok(Self {
            source_root: source.into(),
            dest_root: dest.into(),
            new_prefix: format!(".AIn~{token}.").into(),
            backup_prefix: format!(".AIb~{token}.").into(),
            files: Vec::new(),
        })
    }

    /// Absolute path of the prepared source tree.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Absolute path of the live destination tree.
    #[must_use]
    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Filename prefix marking staged incoming payloads.
    #[must_use]
    pub fn new_prefix(&self) -> &OsStr {
        &self.new_prefix
    }

    /// Filename prefix marking preserved prior-content siblings.
    #[must_use]
    pub fn backup_prefix(&self) -> &OsStr {
        &self.backup_prefix
    }

    /// The participating records, in scan order.
    #[must_use]
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// Mutable view of the records. The backup stage flips `existed` flags
    /// through this.
    pub fn files_mut(&mut self) -> &mut [FileRecord] {
        &mut self.files
    }
}

/// Short printable transaction tag: 8 bytes from the OS CSPRNG, hex.
fn transaction_token() -> Result<String, JournalError> {
    let mut raw = [0u8; 8];
    getrandom::fill(&mut raw).map_err(JournalError::Token)?;

    let mut token = String::with_capacity(raw.len() * 2);
    for byte in raw {
        let _ = write!(token, "{byte:02x}");
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_share_one_token_per_transaction() {
        let journal = Journal::new("/src", "/dst").expect("create journal");

        let new_prefix = journal.new_prefix().to_str().expect("ascii prefix");
        let backup_prefix = journal.backup_prefix().to_str().expect("ascii prefix");

        assert!(new_prefix.starts_with(".AIn~") && new_prefix.ends_with('.'));
        assert!(backup_prefix.starts_with(".AIb~") && backup_prefix.ends_with('.'));
        assert_eq!(new_prefix[5..], backup_prefix[5..], "token must match across prefixes");
        assert_eq!(new_prefix.len(), ".AIn~".len() + 16 + 1);
    }

    #[test]
    fn transactions_get_distinct_tokens() {
        let a = Journal::new("/src", "/dst").expect("create journal");
        let b = Journal::new("/src", "/dst").expect("create journal");

        assert_ne!(a.new_prefix(), b.new_prefix());
    }
}
