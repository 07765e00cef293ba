//! Archive listing

use crate::archive::{list_archives, ArchiveInfo};
use crate::config::BackupConfig;
use crate::error::{BackupError, BackupResult};

/// Archives under the configured backup root, grouped by kind and oldest
/// first within each kind.
///
/// A backup root that doesn't exist is an error; an empty one is not.
pub fn list_backups(config: &BackupConfig) -> BackupResult<Vec<ArchiveInfo>> {
    if !config.backup_root.is_dir() {
        return Err(BackupError::NotFound {
            entity_type: "backup directory",
            identifier: config.backup_root.display().to_string(),
        });
    }
    list_archives(&config.backup_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigPaths, Settings};
    use crate::context::{Platform, RuntimeContext};
    use crate::models::BackupKind;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &std::path::Path) -> BackupConfig {
        let ctx = RuntimeContext::new(Utc::now(), Platform::Linux, BTreeMap::new(), root.to_path_buf());
        let mut settings = Settings::default();
        settings.profile.path = root.join("profile").display().to_string();
        settings.backup.local_path = root.join("backups").display().to_string();
        settings
            .resolve(&ctx, &ConfigPaths::with_settings_file(root.join("settings.toml")))
            .unwrap()
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = list_backups(&config(temp.path())).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_lists_both_kinds() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        fs::create_dir_all(config.backup_root.join("daily")).unwrap();
        fs::create_dir_all(config.backup_root.join("weekly")).unwrap();
        assert!(list_backups(&config).unwrap().is_empty());

        fs::write(config.backup_root.join("daily/zen-backup-daily-2026-01-02.tar.gz"), "a").unwrap();
        fs::write(config.backup_root.join("weekly/zen-backup-weekly-2026-01-04.tar.gz"), "b").unwrap();
        fs::write(config.backup_root.join("backup.log"), "").unwrap();

        let archives = list_backups(&config).unwrap();
        let kinds: Vec<BackupKind> = archives.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![BackupKind::Daily, BackupKind::Weekly]);
    }
}
