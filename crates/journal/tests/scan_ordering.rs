//! Integration tests for source-tree scanning.
//!
//! The record list the scanner produces is the engine's work order; these
//! tests pin down the root-first, parents-before-children invariant and
//! the scan-time content fingerprinting.

use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use journal::{FileKind, Journal, JournalError};

fn scanned(source: &Path) -> Journal {
    let mut journal = Journal::new(source, "/unused-dest").expect("create journal");
    journal.scan_files().expect("scan");
    journal
}

/// Relative path of the directory containing `rel`, `"/"` for top-level
/// entries.
fn parent_of(rel: &OsStr) -> &OsStr {
    let bytes = rel.as_bytes();
    let split = bytes
        .iter()
        .rposition(|&b| b == b'/')
        .expect("record paths begin with '/'");
    if split == 0 {
        OsStr::new("/")
    } else {
        OsStr::from_bytes(&bytes[..split])
    }
}

#[test]
fn empty_tree_yields_root_record_only() {
    let temp = tempfile::tempdir().expect("create tempdir");

    let journal = scanned(temp.path());

    let files = journal.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path(), "/");
    assert_eq!(files[0].kind(), FileKind::Directory);
}

#[test]
fn every_parent_directory_precedes_its_children() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let root = temp.path();
    fs::write(root.join("a"), b"a").expect("write a");
    fs::create_dir_all(root.join("dir/sub")).expect("create dirs");
    fs::write(root.join("dir/b"), b"b").expect("write b");
    fs::write(root.join("dir/sub/c"), b"c").expect("write c");
    fs::write(root.join("z"), b"z").expect("write z");

    let journal = scanned(root);
    let files = journal.files();

    assert_eq!(files[0].path(), "/", "root record must come first");
    assert_eq!(files.len(), 6);

    for record in &files[1..] {
        let parent = parent_of(record.path());
        let parent_index = files
            .iter()
            .position(|r| r.path() == parent)
            .unwrap_or_else(|| panic!("parent {parent:?} of {:?} missing", record.path()));
        let child_index = files
            .iter()
            .position(|r| r.path() == record.path())
            .expect("record is in the list");

        assert!(
            parent_index < child_index,
            "{parent:?} must precede {:?}",
            record.path()
        );
        assert_eq!(files[parent_index].kind(), FileKind::Directory);
    }
}

#[test]
fn regular_records_carry_source_digest_and_mtime() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let root = temp.path();
    fs::write(root.join("payload"), b"some body of content").expect("write payload");

    let journal = scanned(root);
    let record = journal
        .files()
        .iter()
        .find(|r| r.path() == "/payload")
        .expect("payload record");

    assert_eq!(record.kind(), FileKind::Regular);
    assert_eq!(
        record.digest(),
        checksums::digest_bytes(b"some body of content"),
        "digest must fingerprint the source bytes at scan time"
    );
    assert!(record.mtime() > 0);
    assert!(!record.existed());
}

#[test]
fn directory_records_carry_zero_digest() {
    let temp = tempfile::tempdir().expect("create tempdir");
    fs::create_dir(temp.path().join("lib")).expect("create dir");

    let journal = scanned(temp.path());
    let record = journal
        .files()
        .iter()
        .find(|r| r.path() == "/lib")
        .expect("lib record");

    assert_eq!(record.kind(), FileKind::Directory);
    assert_eq!(record.digest(), journal::ContentDigest::ZERO);
}

#[test]
fn symlink_aborts_scan() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let root = temp.path();
    fs::write(root.join("target"), b"x").expect("write target");
    std::os::unix::fs::symlink(root.join("target"), root.join("link")).expect("create symlink");

    let mut journal = Journal::new(root, "/unused-dest").expect("create journal");
    let err = journal.scan_files().expect_err("symlinks are outside the contract");

    assert!(
        matches!(err, JournalError::Fs(fsops::FsError::UnknownFileType { .. })),
        "got: {err}"
    );
}

#[test]
fn regular_source_root_is_rejected() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let file = temp.path().join("not-a-dir");
    fs::write(&file, b"x").expect("write file");

    let mut journal = Journal::new(&file, "/unused-dest").expect("create journal");
    let err = journal.scan_files().expect_err("scan needs a directory root");

    assert!(matches!(err, JournalError::SourceNotDirectory { .. }), "got: {err}");
}
