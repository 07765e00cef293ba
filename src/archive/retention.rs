//! Retention pruning
//!
//! Age is computed from the date embedded in the filename only; modification
//! times are never consulted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::naming::ArchiveName;
use crate::models::BackupKind;

/// Archives removed by one pruning pass
#[derive(Debug, Clone, Default)]
pub struct PruneOutcome {
    pub deleted: Vec<PathBuf>,
}

/// Delete archives in `<root>/<kind>/` whose age exceeds `retention_days`.
///
/// `age = floor((now - date) / 1 day)`, with the date taken as midnight UTC.
/// An archive exactly `retention_days` old is kept. Files that don't follow
/// the archive grammar are left alone, individual delete failures are
/// skipped, and a missing directory prunes nothing.
pub fn prune(root: &Path, kind: BackupKind, retention_days: u32, now: DateTime<Utc>) -> PruneOutcome {
    let dir = root.join(kind.as_str());
    let mut outcome = PruneOutcome::default();

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => return outcome,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let Some(name) = ArchiveName::from_path(&path) else {
            continue;
        };
        if name.kind != kind {
            continue;
        }
        let Some(midnight) = name.date.and_hms_opt(0, 0, 0) else {
            continue;
        };

        let age_days = (now - midnight.and_utc()).num_days();
        if age_days <= i64::from(retention_days) {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(archive = %path.display(), age_days, "pruned");
                outcome.deleted.push(path);
            }
            Err(e) => warn!(archive = %path.display(), error = %e, "failed to prune"),
        }
    }

    outcome.deleted.sort();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("daily");
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();

        let expired = touch(&dir, "zen-backup-daily-2025-12-31.tar.gz"); // 31 days
        let boundary = touch(&dir, "zen-backup-daily-2026-01-01.tar.gz"); // 30 days
        let fresh = touch(&dir, "zen-backup-daily-2026-01-30-2.tar.gz");

        let outcome = prune(temp.path(), BackupKind::Daily, 30, now);
        assert_eq!(outcome.deleted, vec![expired.clone()]);
        assert!(!expired.exists());
        assert!(boundary.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn test_foreign_files_untouched() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("weekly");
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        let log = touch(&dir, "backup.log");
        let other = touch(&dir, "notes-2020-01-01.tar.gz");
        let wrong_kind = touch(&dir, "zen-backup-daily-2020-01-01.tar.gz");
        let old = touch(&dir, "zen-backup-weekly-2020-01-05.tar.gz");

        let outcome = prune(temp.path(), BackupKind::Weekly, 84, now);
        assert_eq!(outcome.deleted, vec![old]);
        assert!(log.exists());
        assert!(other.exists());
        assert!(wrong_kind.exists());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let outcome = prune(temp.path(), BackupKind::Daily, 1, Utc::now());
        assert!(outcome.deleted.is_empty());
    }
}
