use engine::EngineError;
use journal::JournalError;

/// Exit codes reported by the `atomic-install` binary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion.
    Ok = 0,

    /// Syntax or usage error on the command line.
    Syntax = 1,

    /// The journal file was rejected: bad magic, truncation, or a record
    /// kind this build does not know.
    Format = 2,

    /// The source tree contains a node the installer does not support
    /// (symlink, device, fifo, socket), or is not a directory at all.
    Unsupported = 4,

    /// A filesystem operation failed.
    FileIo = 11,

    /// A stage failed and the destination was rolled back to its
    /// pre-install state.
    Reverted = 23,
}

impl ExitCode {
    /// Numeric value handed to the OS.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Short human description, used in final log lines.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "usage error",
            Self::Format => "journal format error",
            Self::Unsupported => "unsupported source node",
            Self::FileIo => "file I/O error",
            Self::Reverted => "install failed, destination reverted",
        }
    }

    /// Converts to the std process exit code.
    #[must_use]
    pub fn process(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self.as_i32() as u8)
    }
}

impl From<&JournalError> for ExitCode {
    fn from(err: &JournalError) -> Self {
        match err {
            JournalError::BadMagic { .. }
            | JournalError::BadEndMagic { .. }
            | JournalError::ShortRead { .. }
            | JournalError::UnknownKind { .. } => Self::Format,
            JournalError::Fs(fsops::FsError::UnknownFileType { .. })
            | JournalError::SourceNotDirectory { .. } => Self::Unsupported,
            JournalError::Fs(_) | JournalError::Io { .. } | JournalError::Token(_) => Self::FileIo,
        }
    }
}

impl From<&EngineError> for ExitCode {
    fn from(_: &EngineError) -> Self {
        Self::FileIo
    }
}

#[cfg(test)]
mod tests {
    use super::ExitCode;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExitCode::Ok.as_i32(), 0);
        assert_eq!(ExitCode::Syntax.as_i32(), 1);
        assert_eq!(ExitCode::Format.as_i32(), 2);
        assert_eq!(ExitCode::Unsupported.as_i32(), 4);
        assert_eq!(ExitCode::FileIo.as_i32(), 11);
        assert_eq!(ExitCode::Reverted.as_i32(), 23);
    }
}
