//! Scheduler marker files
//!
//! Kept next to the job definitions: `.zen-backup-loaded` records that the
//! jobs were loaded, `.disabled-<job>` that a job is paused. On the
//! simulated backend they are the whole state; on the host they mirror it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BackupError, BackupResult};

pub const LOADED_MARKER: &str = ".zen-backup-loaded";
pub const DISABLED_MARKER_PREFIX: &str = ".disabled-";

/// Marker files in one definition directory
#[derive(Debug, Clone)]
pub struct Markers {
    dir: PathBuf,
}

impl Markers {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn loaded_path(&self) -> PathBuf {
        self.dir.join(LOADED_MARKER)
    }

    pub fn disabled_path(&self, job_name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", DISABLED_MARKER_PREFIX, job_name))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_path().exists()
    }

    pub fn is_disabled(&self, job_name: &str) -> bool {
        self.disabled_path(job_name).exists()
    }

    pub fn set_loaded(&self) -> BackupResult<()> {
        touch(&self.loaded_path())
    }

    pub fn set_disabled(&self, job_name: &str) -> BackupResult<()> {
        touch(&self.disabled_path(job_name))
    }

    pub fn clear_loaded(&self) {
        remove_if_exists(&self.loaded_path());
    }

    pub fn clear_disabled(&self, job_name: &str) {
        remove_if_exists(&self.disabled_path(job_name));
    }
}

fn touch(path: &Path) -> BackupResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| BackupError::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
    }
    fs::write(path, "1")
        .map_err(|e| BackupError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

/// Remove a file, ignoring a missing one
pub fn remove_if_exists(path: &Path) {
    if path.exists() {
        let _ = fs::remove_file(path);
    }
}
