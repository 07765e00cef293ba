//! Archive creation
//!
//! The selected profile tree is staged in a private temporary directory and
//! compressed from there, so the archive never sees a file mid-write. The
//! staging directory is removed when the `TempDir` drops, on every path.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::selection::should_include;
use crate::error::{BackupError, BackupResult};
use crate::sqlite;

/// Result of a successful archive creation
#[derive(Debug, Clone, Default)]
pub struct ArchiveOutcome {
    /// Non-fatal problems, one line each (fallback copies, skipped databases)
    pub warnings: Vec<String>,
    /// Number of files captured
    pub file_count: usize,
}

/// Capture `profile_root` into a gzip-compressed tar at `archive_path`.
///
/// On failure the partially written archive is removed before the error is
/// returned.
pub fn create_archive(profile_root: &Path, archive_path: &Path) -> BackupResult<ArchiveOutcome> {
    let staging = tempfile::Builder::new()
        .prefix("zen-backup-staging-")
        .tempdir()
        .map_err(|e| BackupError::Io(format!("Failed to create staging directory: {}", e)))?;

    let outcome = stage_profile(profile_root, staging.path())?;

    if let Some(parent) = archive_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| BackupError::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    if let Err(e) = write_archive(staging.path(), archive_path) {
        let _ = fs::remove_file(archive_path);
        return Err(e);
    }

    debug!(
        archive = %archive_path.display(),
        files = outcome.file_count,
        "archive written"
    );
    Ok(outcome)
}

/// Copy the selected entries of `profile_root` into `staging`
fn stage_profile(profile_root: &Path, staging: &Path) -> BackupResult<ArchiveOutcome> {
    let mut outcome = ArchiveOutcome::default();

    let walker = WalkDir::new(profile_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            relative_name(profile_root, entry.path())
                .map(|rel| should_include(&rel, entry.file_type().is_dir()))
                .unwrap_or(false)
        });

    for entry in walker {
        let entry = entry.map_err(|e| BackupError::Io(format!("Failed to read profile: {}", e)))?;
        let Some(rel) = relative_name(profile_root, entry.path()) else {
            continue;
        };
        let target = staging.join(&rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| BackupError::Io(format!("Failed to stage {}: {}", rel, e)))?;
            continue;
        }

        // Symlinks and special files are not captured
        if !file_type.is_file() {
            continue;
        }

        if sqlite::is_database_file(entry.path()) {
            let copy = match sqlite::safe_copy(entry.path(), &target) {
                Ok(copy) => copy,
                Err(e) if e.is_integrity() => {
                    warn!(file = %rel, error = %e, "corrupt database skipped");
                    sqlite::remove_with_siblings(&target);
                    outcome.warnings.push(format!("corrupt sqlite skipped: {}", rel));
                    continue;
                }
                Err(e) => return Err(e),
            };
            if copy.used_fallback {
                warn!(file = %rel, "database was busy, used fallback copy");
                outcome
                    .warnings
                    .push(format!("sqlite fallback copy used for {}", rel));
            }
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| BackupError::Io(format!("Failed to stage {}: {}", rel, e)))?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|e| BackupError::Io(format!("Failed to stage {}: {}", rel, e)))?;
        }
        outcome.file_count += 1;
    }

    Ok(outcome)
}

/// Compress the staged tree; entries are relative and sorted
fn write_archive(staging: &Path, archive_path: &Path) -> BackupResult<()> {
    let file = File::create(archive_path)
        .map_err(|e| BackupError::Io(format!("Failed to create archive file: {}", e)))?;

    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar_builder = Builder::new(encoder);
    tar_builder.follow_symlinks(false);

    for entry in WalkDir::new(staging).min_depth(1).sort_by_file_name() {
        let entry =
            entry.map_err(|e| BackupError::Io(format!("Failed to read staging directory: {}", e)))?;
        let Some(rel) = relative_name(staging, entry.path()) else {
            continue;
        };

        if entry.file_type().is_dir() {
            tar_builder
                .append_dir(&rel, entry.path())
                .map_err(|e| BackupError::Io(format!("Failed to append {}: {}", rel, e)))?;
        } else {
            let mut src_file = File::open(entry.path())
                .map_err(|e| BackupError::Io(format!("Failed to open {}: {}", rel, e)))?;
            tar_builder
                .append_file(&rel, &mut src_file)
                .map_err(|e| BackupError::Io(format!("Failed to append {}: {}", rel, e)))?;
        }
    }

    tar_builder
        .into_inner()
        .map_err(|e| BackupError::Io(format!("Failed to finish archive: {}", e)))?
        .finish()
        .map_err(|e| BackupError::Io(format!("Failed to finish compression: {}", e)))?;

    Ok(())
}

/// `/`-separated path of `path` relative to `root`
fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let rel: PathBuf = path.strip_prefix(root).ok()?.to_path_buf();
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
