//! Integration tests for the journal's on-disk format.
//!
//! A journal must survive a write/read round trip bit-exactly (including
//! backup-stage `existed` mutations), and the codec must reject anything
//! truncated or with damaged magics; the journal is the only thing crash
//! recovery has to go on.

use std::fs;
use std::path::Path;

use journal::{Journal, JournalError};

fn sample_tree(root: &Path) {
    fs::write(root.join("a"), b"alpha").expect("write a");
    fs::create_dir(root.join("dir")).expect("create dir");
    fs::write(root.join("dir/b"), b"beta").expect("write b");
}

fn scanned_journal(source: &Path) -> Journal {
    let mut journal = Journal::new(source, "/some/dest").expect("create journal");
    journal.scan_files().expect("scan");
    journal
}

#[test]
fn round_trip_preserves_everything() {
    let temp = tempfile::tempdir().expect("create tempdir");
    sample_tree(temp.path());
    let journal = scanned_journal(temp.path());

    let path = temp.path().join("journal.AIj");
    journal.save(&path).expect("save");
    let loaded = Journal::load(&path).expect("load");

    assert_eq!(loaded, journal);
}

#[test]
fn round_trip_preserves_existed_flags() {
    let temp = tempfile::tempdir().expect("create tempdir");
    sample_tree(temp.path());
    let mut journal = scanned_journal(temp.path());

    for record in journal.files_mut() {
        if record.kind() == journal::FileKind::Regular {
            record.set_existed(true);
        }
    }

    let path = temp.path().join("journal.AIj");
    journal.save(&path).expect("save");
    let loaded = Journal::load(&path).expect("load");

    assert_eq!(loaded, journal);
    assert!(loaded.files().iter().any(journal::FileRecord::existed));
}

#[test]
fn save_replaces_existing_journal_atomically() {
    let temp = tempfile::tempdir().expect("create tempdir");
    sample_tree(temp.path());
    let journal = scanned_journal(temp.path());

    let path = temp.path().join("journal.AIj");
    fs::write(&path, b"stale bytes that are not a journal").expect("write stale file");
    journal.save(&path).expect("save over stale file");

    assert_eq!(Journal::load(&path).expect("load"), journal);

    // No temp sibling may survive the save.
    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .expect("read dir")
        .map(|e| e.expect("entry").file_name())
        .filter(|name| {
            let name = name.to_string_lossy();
            name.starts_with("journal.AIj.")
        })
        .collect();
    assert!(leftovers.is_empty(), "staging leftovers: {leftovers:?}");
}

#[test]
fn every_truncation_is_rejected() {
    let temp = tempfile::tempdir().expect("create tempdir");
    sample_tree(temp.path());
    let journal = scanned_journal(temp.path());

    let path = temp.path().join("journal.AIj");
    journal.save(&path).expect("save");
    let bytes = fs::read(&path).expect("read journal bytes");

    let truncated_path = temp.path().join("truncated.AIj");
    for len in 0..bytes.len() {
        fs::write(&truncated_path, &bytes[..len]).expect("write truncated copy");
        assert!(
            Journal::load(&truncated_path).is_err(),
            "truncation to {len} of {} bytes must not decode",
            bytes.len()
        );
    }
}

#[test]
fn corrupt_start_magic_is_named() {
    let temp = tempfile::tempdir().expect("create tempdir");
    sample_tree(temp.path());
    let path = temp.path().join("journal.AIj");
    scanned_journal(temp.path()).save(&path).expect("save");

    let mut bytes = fs::read(&path).expect("read journal bytes");
    bytes[0] ^= 0xff;
    fs::write(&path, &bytes).expect("write corrupted");

    let err = Journal::load(&path).expect_err("corrupt start magic");
    assert!(matches!(err, JournalError::BadMagic { .. }), "got: {err}");
}

#[test]
fn corrupt_end_magic_is_named() {
    let temp = tempfile::tempdir().expect("create tempdir");
    sample_tree(temp.path());
    let path = temp.path().join("journal.AIj");
    scanned_journal(temp.path()).save(&path).expect("save");

    let mut bytes = fs::read(&path).expect("read journal bytes");
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, &bytes).expect("write corrupted");

    let err = Journal::load(&path).expect_err("corrupt end magic");
    assert!(matches!(err, JournalError::BadEndMagic { .. }), "got: {err}");
}

#[test]
fn unknown_flag_bits_are_ignored() {
    let temp = tempfile::tempdir().expect("create tempdir");
    sample_tree(temp.path());
    let journal = scanned_journal(temp.path());

    let path = temp.path().join("journal.AIj");
    journal.save(&path).expect("save");

    // The last record's flags field sits immediately before the
    // end-of-list byte and the trailing magic. Set a bit this build does
    // not define.
    let mut bytes = fs::read(&path).expect("read journal bytes");
    let flags_high = bytes.len() - 4 - 1 - 1;
    bytes[flags_high] |= 0x80;
    fs::write(&path, &bytes).expect("write modified");

    let loaded = Journal::load(&path).expect("unknown flag bits must not reject");
    assert_eq!(loaded, journal);
}

#[test]
fn missing_journal_reports_io_error() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let err = Journal::load(&temp.path().join("absent.AIj")).expect_err("load of missing file");
    assert!(matches!(err, JournalError::Io { .. }), "got: {err}");
}
