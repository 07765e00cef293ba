//! Restore engine for zen-backup
//!
//! Restores a profile from an archive without ever leaving it half-written:
//! the archive is located and validated, extracted outside the profile, and
//! only then is the live profile renamed aside and replaced.
//!
//! - `locate`: resolving a user-supplied archive name to a file
//! - `validate`: listing entries and rejecting unsafe ones before extraction
//! - `engine`: extraction, profile rotation and post-restore checks

pub mod engine;
pub mod locate;
pub mod validate;

pub use engine::{pre_restore_path, restore, RestoreOutcome};
pub use locate::locate_archive;
pub use validate::{list_entries, validate_archive, ArchiveEntry};
