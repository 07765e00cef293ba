//! Archive engine for zen-backup
//!
//! Snapshots a profile directory into dated gzip-compressed tar archives and
//! manages them on disk.
//!
//! - `naming`: the archive filename grammar and the collision policy
//! - `selection`: which profile entries are captured
//! - `builder`: staging and compression
//! - `inventory`: listing archives for `list` and `status`
//! - `retention`: age-based pruning

pub mod builder;
pub mod inventory;
pub mod naming;
pub mod retention;
pub mod selection;

pub use builder::{create_archive, ArchiveOutcome};
pub use inventory::{format_size, list_archives, newest_archive, ArchiveInfo};
pub use naming::{next_archive_path, ArchiveName, ARCHIVE_PREFIX};
pub use retention::{prune, PruneOutcome};
pub use selection::should_include;
