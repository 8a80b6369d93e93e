use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while scanning, encoding or decoding a journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// A filesystem operation failed during scan.
    #[error(transparent)]
    Fs(#[from] fsops::FsError),

    /// Reading or writing the journal file failed.
    #[error("journal I/O failed: {}", .path.display())]
    Io {
        /// The journal (or temp sibling) path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file does not begin with the journal magic.
    #[error("journal magic invalid: {}", .path.display())]
    BadMagic {
        /// The rejected file.
        path: PathBuf,
    },

    /// The trailing magic is missing or corrupt.
    #[error("journal end magic invalid: {}", .path.display())]
    BadEndMagic {
        /// The rejected file.
        path: PathBuf,
    },

    /// The file ended in the middle of a record.
    #[error("short read occurred: {}", .path.display())]
    ShortRead {
        /// The truncated file.
        path: PathBuf,
    },

    /// A record carried a kind byte this build does not know.
    #[error("unknown record kind {kind} in journal: {}", .path.display())]
    UnknownKind {
        /// The offending kind byte.
        kind: u8,
        /// The rejected file.
        path: PathBuf,
    },

    /// The source root is not a directory, so there is no tree to scan.
    #[error("source root is not a directory: {}", .path.display())]
    SourceNotDirectory {
        /// The offending root.
        path: PathBuf,
    },

    /// The OS random source failed while deriving the transaction token.
    #[error("random token generation failed")]
    Token(#[source] getrandom::Error),
}
