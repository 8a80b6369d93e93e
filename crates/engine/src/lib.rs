#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The install engine executes a scanned [`Journal`](journal::Journal)
//! against the live destination tree in four stages, each re-entrant:
//!
//! 1. [`copy_files`]: materialize directories and stage every new payload
//!    as a `new_prefix` sibling of its final name.
//! 2. [`backup_files`]: hardlink each live file to a `backup_prefix`
//!    sibling, recording which destinations actually existed.
//! 3. [`replace`]: rename every staged payload onto its final name. Each
//!    rename is atomic; the first one is the transaction's commit point.
//! 4. [`cleanup`]: drop remaining staged and backup siblings.
//!
//! [`revert`] is the rollback branch: taken instead of replace/cleanup, it
//! restores backed-up files and unlinks the ones that had no prior
//! content, returning the destination to its pre-install state.
//!
//! # Invariants
//!
//! - Records are processed in journal list order, so directories exist
//!   before anything is staged inside them.
//! - Stage-specific errnos are absorbed where they are part of normal
//!   operation (`EEXIST` while creating a directory, `ENOENT` while
//!   backing up a file that has no predecessor or reverting one that was
//!   already reverted); everything else aborts the stage with the failing
//!   stage named in the error.
//! - The destination is assumed not to be mutated by anyone else for the
//!   duration of the transaction; the engine takes no locks.

mod error;
mod stages;
mod state;

pub use error::{EngineError, Stage};
pub use stages::{backup_files, cleanup, copy_files, replace, revert};
pub use state::InstallState;
