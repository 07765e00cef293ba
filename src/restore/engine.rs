//! Restore execution
//!
//! Order matters: nothing under the profile path changes until the archive
//! has been validated and fully extracted to a staging directory. The only
//! irreversible step, moving the live profile aside, is a single rename.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::locate::locate_archive;
use super::validate::validate_archive;
use crate::browser;
use crate::config::BackupConfig;
use crate::context::RuntimeContext;
use crate::error::{BackupError, BackupResult};
use crate::sqlite;

/// Result of a completed restore
#[derive(Debug)]
pub struct RestoreOutcome {
    /// Archive the profile was restored from
    pub archive_path: PathBuf,
    /// Where the previous profile was moved
    pub pre_restore_path: PathBuf,
    /// Databases in the restored profile that failed the integrity check
    pub integrity_failures: Vec<BackupError>,
}

/// Restore the configured profile from the archive named by `locator`.
///
/// Fails with no mutation if the browser is running, the archive can't be
/// found, or it doesn't validate. Database integrity failures after the swap
/// are reported in the outcome; the restored profile stays in place.
pub fn restore(
    locator: &str,
    config: &BackupConfig,
    ctx: &RuntimeContext,
) -> BackupResult<RestoreOutcome> {
    if browser::is_running(ctx) {
        return Err(BackupError::Precondition(
            "Zen browser must be closed before restoring".into(),
        ));
    }

    let archive_path = locate_archive(locator, &config.backup_root, &ctx.cwd)?;
    let entries = validate_archive(&archive_path)?;
    debug!(archive = %archive_path.display(), entries = entries.len(), "archive validated");

    let staging = tempfile::Builder::new()
        .prefix("zen-restore-staging-")
        .tempdir()
        .map_err(|e| BackupError::Io(format!("Failed to create staging directory: {}", e)))?;
    extract(&archive_path, staging.path())?;

    let pre_restore_path = rotate_profile(&config.profile_path, ctx.today())?;
    info!(
        profile = %config.profile_path.display(),
        pre_restore = %pre_restore_path.display(),
        "previous profile moved aside"
    );

    fs::create_dir_all(&config.profile_path)
        .map_err(|e| BackupError::Io(format!("Failed to create profile directory: {}", e)))?;
    copy_tree(staging.path(), &config.profile_path)?;
    drop(staging);

    let integrity_failures = check_databases(&config.profile_path);

    Ok(RestoreOutcome {
        archive_path,
        pre_restore_path,
        integrity_failures,
    })
}

fn extract(archive_path: &Path, staging: &Path) -> BackupResult<()> {
    let file = File::open(archive_path)
        .map_err(|e| BackupError::Io(format!("Failed to open archive: {}", e)))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(false);

    archive.unpack(staging).map_err(|e| {
        BackupError::InvalidArchive(format!(
            "{} ({})",
            archive_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            e
        ))
    })
}

/// `<profile>.pre-restore-YYYY-MM-DD`, then `-2`, `-3`, ... until free
pub fn pre_restore_path(profile_path: &Path, date: NaiveDate) -> PathBuf {
    let name = profile_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".to_string());
    let parent = profile_path.parent().unwrap_or_else(|| Path::new(""));
    let stem = format!("{}.pre-restore-{}", name, date.format("%Y-%m-%d"));

    let first = parent.join(&stem);
    if !first.exists() {
        return first;
    }

    let mut index = 2;
    loop {
        let candidate = parent.join(format!("{}-{}", stem, index));
        if !candidate.exists() {
            return candidate;
        }
        index += 1;
    }
}

/// Move the live profile to its pre-restore path, or create an empty
/// placeholder there if there is no profile yet
fn rotate_profile(profile_path: &Path, date: NaiveDate) -> BackupResult<PathBuf> {
    let target = pre_restore_path(profile_path, date);

    if profile_path.exists() {
        fs::rename(profile_path, &target).map_err(|e| {
            BackupError::Io(format!(
                "Failed to move profile to {}: {}",
                target.display(),
                e
            ))
        })?;
    } else {
        fs::create_dir_all(&target).map_err(|e| {
            BackupError::Io(format!("Failed to create {}: {}", target.display(), e))
        })?;
    }

    Ok(target)
}

fn copy_tree(from: &Path, to: &Path) -> BackupResult<()> {
    for entry in WalkDir::new(from).min_depth(1) {
        let entry =
            entry.map_err(|e| BackupError::Io(format!("Failed to read staging directory: {}", e)))?;
        let Ok(rel) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| BackupError::Io(format!("Failed to create {}: {}", target.display(), e)))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    BackupError::Io(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|e| BackupError::Io(format!("Failed to restore {}: {}", rel.display(), e)))?;
        }
    }
    Ok(())
}

fn check_databases(profile_path: &Path) -> Vec<BackupError> {
    WalkDir::new(profile_path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && sqlite::is_database_file(e.path()))
        .filter_map(|e| sqlite::integrity_check(e.path()).err())
        .collect()
}
