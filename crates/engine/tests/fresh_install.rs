//! Fresh installation into an empty destination.

use std::fs;
use std::path::Path;

use journal::Journal;

fn scanned(source: &Path, dest: &Path) -> Journal {
    let mut journal = Journal::new(source, dest).expect("create journal");
    journal.scan_files().expect("scan");
    journal
}

/// Recursively collects file names that carry either transaction prefix.
fn salted_leftovers(root: &Path, journal: &Journal) -> Vec<String> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).expect("read dir") {
            let entry = entry.expect("entry");
            if entry.file_type().expect("file type").is_dir() {
                stack.push(entry.path());
            }
            let name = entry.file_name();
            let name = name.to_string_lossy().into_owned();
            for prefix in [journal.new_prefix(), journal.backup_prefix()] {
                if name.starts_with(&*prefix.to_string_lossy()) {
                    found.push(name.clone());
                }
            }
        }
    }
    found
}

#[test]
fn installs_whole_tree_into_empty_destination() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let source = temp.path().join("source");
    let dest = temp.path().join("dest");
    fs::create_dir(&source).expect("create source");
    fs::create_dir(&dest).expect("create dest");

    fs::write(source.join("a"), b"alpha").expect("write a");
    fs::write(source.join("b"), b"beta").expect("write b");
    fs::create_dir(source.join("dir")).expect("create dir");
    fs::write(source.join("dir/c"), b"gamma").expect("write c");
    fs::write(source.join("dir/d"), b"delta").expect("write d");

    let mut journal = scanned(&source, &dest);
    engine::copy_files(&journal).expect("copy");
    engine::backup_files(&mut journal).expect("backup");
    engine::replace(&journal).expect("replace");
    engine::cleanup(&journal).expect("cleanup");

    assert_eq!(fs::read(dest.join("a")).expect("read a"), b"alpha");
    assert_eq!(fs::read(dest.join("b")).expect("read b"), b"beta");
    assert_eq!(fs::read(dest.join("dir/c")).expect("read c"), b"gamma");
    assert_eq!(fs::read(dest.join("dir/d")).expect("read d"), b"delta");

    assert!(
        journal.files().iter().all(|r| !r.existed()),
        "an empty destination has nothing to back up"
    );
    assert_eq!(salted_leftovers(&dest, &journal), Vec::<String>::new());
}

#[test]
fn copy_stage_is_reentrant() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let source = temp.path().join("source");
    let dest = temp.path().join("dest");
    fs::create_dir(&source).expect("create source");
    fs::create_dir(&dest).expect("create dest");
    fs::write(source.join("x"), b"payload").expect("write x");

    let mut journal = scanned(&source, &dest);

    // A partial prior run is modeled by simply running the stage twice.
    engine::copy_files(&journal).expect("first copy");
    engine::copy_files(&journal).expect("second copy");

    engine::backup_files(&mut journal).expect("backup");
    engine::replace(&journal).expect("replace");
    engine::cleanup(&journal).expect("cleanup");

    assert_eq!(fs::read(dest.join("x")).expect("read x"), b"payload");
}
