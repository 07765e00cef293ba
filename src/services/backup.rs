//! Backup service
//!
//! Runs one backup of the configured profile: checks preconditions, builds
//! the archive, prunes old archives, and mirrors the result to the cloud
//! folder when one is configured.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::archive::{create_archive, next_archive_path, prune};
use crate::audit::{BackupLog, LogLevel};
use crate::browser;
use crate::config::BackupConfig;
use crate::context::RuntimeContext;
use crate::error::{BackupError, BackupResult};
use crate::models::BackupKind;
use crate::notify::{notifier_for, Notifier};

/// Logged and sent when a backup runs while the browser is open
pub const BROWSER_RUNNING_WARNING: &str =
    "browser is running; SQLite databases are safely backed up, but session files may be mid-write";

/// What a finished backup did
#[derive(Debug)]
pub struct BackupReport {
    pub kind: BackupKind,
    /// The archive written to the local backup root
    pub archive_path: PathBuf,
    /// Non-fatal problems, already written to the backup log
    pub warnings: Vec<String>,
    /// Local archives removed by retention
    pub pruned: Vec<PathBuf>,
    /// The copy in the cloud folder, if it succeeded
    pub cloud_copy: Option<PathBuf>,
    /// Set when the cloud copy failed; the local archive still stands
    pub cloud_error: Option<BackupError>,
}

/// Service for creating backups
pub struct BackupService<'a> {
    config: &'a BackupConfig,
    ctx: &'a RuntimeContext,
    log: BackupLog,
    notifier: Box<dyn Notifier>,
}

impl<'a> BackupService<'a> {
    /// Create a backup service that notifies the way the settings ask
    pub fn new(config: &'a BackupConfig, ctx: &'a RuntimeContext) -> Self {
        Self::with_notifier(config, ctx, notifier_for(config, ctx))
    }

    pub fn with_notifier(
        config: &'a BackupConfig,
        ctx: &'a RuntimeContext,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            ctx,
            log: BackupLog::new(&config.backup_root),
            notifier,
        }
    }

    /// Create one backup of `kind`
    pub fn run(&self, kind: BackupKind) -> BackupResult<BackupReport> {
        let profile = &self.config.profile_path;
        if !profile.is_dir() {
            let err = BackupError::profile_not_found(profile.display().to_string());
            self.notifier.notify("Zen Backup Error", &err.to_string());
            return Err(err);
        }

        let kind_dir = BackupConfig::kind_dir(&self.config.backup_root, kind);
        fs::create_dir_all(&kind_dir).map_err(|e| {
            BackupError::Io(format!("Failed to create backup directory: {}", e))
        })?;

        if browser::is_running(self.ctx) {
            self.record(LogLevel::Warning, BROWSER_RUNNING_WARNING);
            self.notifier.notify("Zen Backup", BROWSER_RUNNING_WARNING);
        }

        let archive_path = next_archive_path(&kind_dir, kind, self.ctx.today());
        let outcome = match create_archive(profile, &archive_path) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record(LogLevel::Error, &format!("archive creation failed: {}", e));
                return Err(e);
            }
        };
        for warning in &outcome.warnings {
            self.record(LogLevel::Warning, warning);
        }

        let retention_days = self.config.retention_days(kind);
        let pruned = prune(&self.config.backup_root, kind, retention_days, self.ctx.now).deleted;

        let mut report = BackupReport {
            kind,
            archive_path,
            warnings: outcome.warnings,
            pruned,
            cloud_copy: None,
            cloud_error: None,
        };

        if let Some(cloud_root) = &self.config.cloud_root {
            match copy_to_cloud(&report.archive_path, cloud_root, kind) {
                Ok(copy) => {
                    let cloud_pruned = prune(cloud_root, kind, retention_days, self.ctx.now);
                    info!(
                        copy = %copy.display(),
                        pruned = cloud_pruned.deleted.len(),
                        "cloud copy written"
                    );
                    report.cloud_copy = Some(copy);
                }
                Err(e) => {
                    let err = BackupError::CloudSync(e.to_string());
                    self.record(LogLevel::Error, &err.to_string());
                    self.notifier.notify("Zen Backup Warning", &err.to_string());
                    report.cloud_error = Some(err);
                }
            }
        }

        self.record(
            LogLevel::Success,
            &format!("created {} backup {}", kind, report.archive_path.display()),
        );
        Ok(report)
    }

    /// Append to the backup log; a log that can't be written never fails a backup
    fn record(&self, level: LogLevel, message: &str) {
        if let Err(e) = self.log.append(self.ctx.now, level, message) {
            warn!(error = %e, "failed to write backup log");
        }
    }
}

/// Copy `archive` into `<cloud_root>/<kind>/` under the same name
fn copy_to_cloud(archive: &Path, cloud_root: &Path, kind: BackupKind) -> BackupResult<PathBuf> {
    let dir = BackupConfig::kind_dir(cloud_root, kind);
    fs::create_dir_all(&dir)
        .map_err(|e| BackupError::Io(format!("failed to create cloud backup directory: {}", e)))?;

    let name = archive
        .file_name()
        .ok_or_else(|| BackupError::Io(format!("invalid archive path: {}", archive.display())))?;
    let target = dir.join(name);
    fs::copy(archive, &target)
        .map_err(|e| BackupError::Io(format!("failed to copy archive: {}", e)))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::list_archives;
    use crate::config::{ConfigPaths, Settings};
    use crate::context::Platform;
    use crate::notify::NotificationLog;
    use crate::restore::list_entries;
    use crate::sqlite::tests::create_test_db;
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        home: PathBuf,
        ctx: RuntimeContext,
        config: BackupConfig,
    }

    fn fixture(now: &str, cloud: bool) -> Fixture {
        let temp = TempDir::new().unwrap();
        let home = temp.path().to_path_buf();

        let profile = home.join("profile");
        fs::create_dir_all(profile.join("cache2")).unwrap();
        fs::write(profile.join("prefs.js"), "user_pref(\"a\", 1);").unwrap();
        fs::write(profile.join("cache2").join("entry"), "cached").unwrap();
        create_test_db(&profile.join("places.sqlite"), 5);

        let mut env = BTreeMap::new();
        env.insert("HOME".to_string(), home.display().to_string());
        env.insert("ZEN_BACKUP_BROWSER_RUNNING".to_string(), "0".to_string());
        let now: DateTime<Utc> = DateTime::parse_from_rfc3339(now).unwrap().with_timezone(&Utc);
        let ctx = RuntimeContext::new(now, Platform::Linux, env, home.clone());

        let mut settings = Settings::default();
        settings.profile.path = profile.display().to_string();
        settings.backup.local_path = home.join("backups").display().to_string();
        if cloud {
            settings.backup.cloud_path = Some(home.join("cloud").display().to_string());
        }
        let paths = ConfigPaths::with_settings_file(home.join("settings.toml"));
        let config = settings.resolve(&ctx, &paths).unwrap();

        Fixture {
            _temp: temp,
            home,
            ctx,
            config,
        }
    }

    fn service<'a>(f: &'a Fixture) -> BackupService<'a> {
        let notifier = NotificationLog::new(&f.config.backup_root, f.ctx.platform, f.ctx.now);
        BackupService::with_notifier(&f.config, &f.ctx, Box::new(notifier))
    }

    #[test]
    fn test_daily_backup() {
        let f = fixture("2026-01-15T10:00:00Z", false);
        let report = service(&f).run(BackupKind::Daily).unwrap();

        assert_eq!(
            report.archive_path,
            f.home.join("backups/daily/zen-backup-daily-2026-01-15.tar.gz")
        );
        let names: Vec<String> = list_entries(&report.archive_path)
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert!(names.contains(&"prefs.js".to_string()));
        assert!(names.contains(&"places.sqlite".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("cache2")));

        let log = fs::read_to_string(f.home.join("backups/backup.log")).unwrap();
        assert!(log.contains("SUCCESS: created daily backup"));
    }

    #[test]
    fn test_second_backup_same_day_gets_suffix() {
        let f = fixture("2026-01-15T10:00:00Z", false);
        service(&f).run(BackupKind::Daily).unwrap();
        let second = service(&f).run(BackupKind::Daily).unwrap();
        assert!(second
            .archive_path
            .ends_with("zen-backup-daily-2026-01-15-2.tar.gz"));
    }

    #[test]
    fn test_missing_profile_notifies() {
        let mut f = fixture("2026-01-15T10:00:00Z", false);
        f.config.profile_path = f.home.join("nope");

        let err = service(&f).run(BackupKind::Daily).unwrap_err();
        assert!(err.is_precondition());
        let notes = fs::read_to_string(f.home.join("backups/notifications.log")).unwrap();
        assert!(notes.contains("profile path not found"));
        assert!(!f.home.join("backups/daily").exists());
    }

    #[test]
    fn test_browser_running_warns_but_backs_up() {
        let mut f = fixture("2026-01-15T10:00:00Z", false);
        f.ctx
            .env
            .insert("ZEN_BACKUP_BROWSER_RUNNING".to_string(), "1".to_string());

        service(&f).run(BackupKind::Weekly).unwrap();
        let log = fs::read_to_string(f.home.join("backups/backup.log")).unwrap();
        assert!(log.contains("WARNING: browser is running"));
        assert!(log.contains("SUCCESS: created weekly backup"));
    }

    #[test]
    fn test_prunes_expired_archives() {
        let f = fixture("2026-01-31T10:00:00Z", false);
        let daily = f.home.join("backups/daily");
        fs::create_dir_all(&daily).unwrap();
        let old = daily.join("zen-backup-daily-2025-12-31.tar.gz");
        let kept = daily.join("zen-backup-daily-2026-01-01.tar.gz");
        fs::write(&old, "x").unwrap();
        fs::write(&kept, "x").unwrap();

        let report = service(&f).run(BackupKind::Daily).unwrap();
        assert_eq!(report.pruned, vec![old.clone()]);
        assert!(!old.exists());
        assert!(kept.exists());
    }

    #[test]
    fn test_cloud_copy() {
        let f = fixture("2026-01-15T10:00:00Z", true);
        let report = service(&f).run(BackupKind::Daily).unwrap();

        let copy = report.cloud_copy.unwrap();
        assert_eq!(copy, f.home.join("cloud/daily/zen-backup-daily-2026-01-15.tar.gz"));
        assert!(copy.exists());
        assert!(report.cloud_error.is_none());
    }

    #[test]
    fn test_cloud_failure_keeps_local_archive() {
        let f = fixture("2026-01-15T10:00:00Z", true);
        // A file where the cloud directory should be
        fs::write(f.home.join("cloud"), "not a directory").unwrap();

        let report = service(&f).run(BackupKind::Daily).unwrap();
        assert!(report.archive_path.exists());
        assert!(matches!(report.cloud_error, Some(BackupError::CloudSync(_))));

        let log = fs::read_to_string(f.home.join("backups/backup.log")).unwrap();
        assert!(log.contains("ERROR: cloud sync failed"));
        assert!(log.contains("SUCCESS: created daily backup"));
        assert_eq!(list_archives(&f.home.join("backups")).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_database_is_skipped_and_logged() {
        let f = fixture("2026-01-15T10:00:00Z", false);
        let idb = f.config.profile_path.join("storage/default/moz-extension+++abc/idb");
        fs::create_dir_all(&idb).unwrap();
        fs::write(idb.join("broken.sqlite"), vec![0x42u8; 4096]).unwrap();

        let report = service(&f).run(BackupKind::Daily).unwrap();
        assert!(report.archive_path.exists());
        assert!(report
            .warnings
            .iter()
            .any(|w| w == "corrupt sqlite skipped: storage/default/moz-extension+++abc/idb/broken.sqlite"));

        let names: Vec<String> = list_entries(&report.archive_path)
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert!(names.contains(&"places.sqlite".to_string()));
        assert!(!names.iter().any(|n| n.ends_with("broken.sqlite")));

        let log = fs::read_to_string(f.home.join("backups/backup.log")).unwrap();
        assert!(log.contains("WARNING: corrupt sqlite skipped"));
        assert!(log.contains("SUCCESS: created daily backup"));
    }
}
