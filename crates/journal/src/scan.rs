use std::ffi::OsStr;

use fsops::FileKind;
use tracing::{debug, trace};

use crate::composer::PathComposer;
use crate::error::JournalError;
use crate::record::FileRecord;
use crate::Journal;

impl Journal {
    /// Scans the source tree and appends one record per node.
    ///
    /// The walk is breadth-first over the record list itself: the root
    /// directory is appended first, then each directory record in list
    /// order has its entries enumerated and appended behind it. By
    /// construction every record's parent directory appears earlier in the
    /// list, which is what lets the copy stage materialize directories
    /// before their contents.
    ///
    /// Entry order within a directory is whatever the directory stream
    /// yields; only the parent-before-child relation is guaranteed.
    ///
    /// Symlinks and special files abort the scan with an error before any
    /// journal state is persisted.
    pub fn scan_files(&mut self) -> Result<(), JournalError> {
        debug!(source = %self.source_root().display(), "scanning source tree");

        let mut path = PathComposer::new(self.source_root());

        let root = FileRecord::from_source(OsStr::new("/"), self.source_root())?;
        if root.kind() != FileKind::Directory {
            return Err(JournalError::SourceNotDirectory {
                path: self.source_root().to_path_buf(),
            });
        }
        self.files.push(root);

        // Directory expansion appends to the list being iterated, so this
        // is an index loop rather than an iterator.
        let mut index = 0;
        while index < self.files.len() {
            if self.files[index].kind() != FileKind::Directory {
                index += 1;
                continue;
            }

            path.set_directory(self.files[index].path());
            index += 1;

            let entries = fsops::read_dir(path.as_path())?;
            for name in entries {
                let name = name?;
                path.set_filename(&name);

                let record = FileRecord::from_source(path.relative_path(), path.as_path())?;
                trace!(path = %path.as_path().display(), kind = ?record.kind(), "scanned");
                self.files.push(record);
            }
        }

        debug!(files = self.files.len(), "scan complete");
        Ok(())
    }
}
