use std::fmt;

/// Progress marker for one install transaction.
///
/// The driver advances through these in order; the on-disk truth is always
/// the journal plus the salted siblings in the destination tree (staged
/// `new_prefix` files mean at least `Copied`, `backup_prefix` files mean
/// at least partially `BackedUp`).
///
/// | State      | Reached when          | On failure                      |
/// |------------|-----------------------|---------------------------------|
/// | `Scanned`  | journal persisted     | delete journal, nothing to undo |
/// | `Copied`   | copy stage done       | revert, then cleanup            |
/// | `BackedUp` | backup done, journal re-persisted | revert, then cleanup |
/// | `Replaced` | replace done          | re-run to roll forward          |
/// | `Cleaned`  | cleanup done          | terminal; retries are no-ops    |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum InstallState {
    /// The journal names every participating file and is on disk.
    Scanned,
    /// New payloads are staged beside their final names.
    Copied,
    /// Prior content is preserved; `existed` flags are authoritative.
    BackedUp,
    /// All renames are done; the new tree is live.
    Replaced,
    /// Staged and backup siblings are gone. Terminal.
    Cleaned,
}

impl InstallState {
    /// The state entered when the current one's stage succeeds, `None`
    /// from the terminal state.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Scanned => Some(Self::Copied),
            Self::Copied => Some(Self::BackedUp),
            Self::BackedUp => Some(Self::Replaced),
            Self::Replaced => Some(Self::Cleaned),
            Self::Cleaned => None,
        }
    }

    /// Lowercase state name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scanned => "scanned",
            Self::Copied => "copied",
            Self::BackedUp => "backed-up",
            Self::Replaced => "replaced",
            Self::Cleaned => "cleaned",
        }
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
