//! Status service
//!
//! Collects what `status` reports: the configuration, the newest archive of
//! each kind, disk usage, backup health, scheduler state and the tail of the
//! backup log.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDate;
use walkdir::WalkDir;

use crate::archive::{list_archives, newest_archive, ArchiveInfo};
use crate::audit::{BackupLog, LogEntry};
use crate::config::BackupConfig;
use crate::context::RuntimeContext;
use crate::error::BackupResult;
use crate::models::{BackupKind, SchedulerStatus};
use crate::scheduler::PlatformScheduler;

/// A daily backup older than this many days is stale
pub const STALE_AFTER_DAYS: i64 = 3;

/// Log lines shown by `status`
pub const RECENT_LOG_LINES: usize = 5;

/// Health of the daily backups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupHealth {
    /// No daily archive yet
    NoBackups,
    Recent,
    Stale,
}

/// What the backup root looks like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupDirState {
    Missing,
    Unreadable,
    Present(Box<ArchiveSummary>),
}

/// Archive facts for a readable backup root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub latest_daily: Option<ArchiveInfo>,
    pub latest_weekly: Option<ArchiveInfo>,
    pub daily_bytes: u64,
    pub weekly_bytes: u64,
    pub health: BackupHealth,
}

impl ArchiveSummary {
    pub fn total_bytes(&self) -> u64 {
        self.daily_bytes + self.weekly_bytes
    }

    pub fn latest(&self, kind: BackupKind) -> Option<&ArchiveInfo> {
        match kind {
            BackupKind::Daily => self.latest_daily.as_ref(),
            BackupKind::Weekly => self.latest_weekly.as_ref(),
        }
    }
}

/// Everything `status` reports for an installed agent
#[derive(Debug, Clone)]
pub struct InstalledStatus {
    pub config: BackupConfig,
    pub backup_dir: BackupDirState,
    pub scheduler: SchedulerStatus,
    pub recent_log: Vec<LogEntry>,
}

/// `status` result
#[derive(Debug, Clone)]
pub enum StatusReport {
    /// No settings file
    NotInstalled,
    Installed(Box<InstalledStatus>),
}

/// Gather the status report
pub fn collect_status(ctx: &RuntimeContext) -> BackupResult<StatusReport> {
    let Some(config) = BackupConfig::load_optional(ctx)? else {
        return Ok(StatusReport::NotInstalled);
    };

    let backup_dir = inspect_backup_dir(&config.backup_root, ctx.today())?;
    let scheduler = PlatformScheduler::for_context(ctx).query()?;
    let recent_log = if matches!(backup_dir, BackupDirState::Present(_)) {
        BackupLog::new(&config.backup_root).read_recent(RECENT_LOG_LINES)?
    } else {
        Vec::new()
    };

    Ok(StatusReport::Installed(Box::new(InstalledStatus {
        config,
        backup_dir,
        scheduler,
        recent_log,
    })))
}

fn inspect_backup_dir(root: &Path, today: NaiveDate) -> BackupResult<BackupDirState> {
    if !root.exists() {
        return Ok(BackupDirState::Missing);
    }
    if let Err(e) = fs::read_dir(root) {
        if e.kind() == ErrorKind::PermissionDenied {
            return Ok(BackupDirState::Unreadable);
        }
    }

    let archives = list_archives(root)?;
    let latest_daily = newest_archive(&archives, BackupKind::Daily).cloned();
    let latest_weekly = newest_archive(&archives, BackupKind::Weekly).cloned();
    let health = health(latest_daily.as_ref().and_then(|a| a.date), today);

    Ok(BackupDirState::Present(Box::new(ArchiveSummary {
        latest_daily,
        latest_weekly,
        daily_bytes: directory_size(&root.join(BackupKind::Daily.as_str())),
        weekly_bytes: directory_size(&root.join(BackupKind::Weekly.as_str())),
        health,
    })))
}

/// Health judged from the newest daily archive's embedded date
pub fn health(latest_daily: Option<NaiveDate>, today: NaiveDate) -> BackupHealth {
    match latest_daily {
        None => BackupHealth::NoBackups,
        Some(date) if (today - date).num_days() > STALE_AFTER_DAYS => BackupHealth::Stale,
        Some(_) => BackupHealth::Recent,
    }
}

fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigPaths, Settings};
    use crate::context::Platform;
    use crate::models::JobState;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn context(home: &Path) -> RuntimeContext {
        let mut env = BTreeMap::new();
        env.insert("HOME".to_string(), home.display().to_string());
        env.insert(
            "ZEN_BACKUP_CONFIG".to_string(),
            home.join("settings.toml").display().to_string(),
        );
        env.insert("ZEN_BACKUP_SCHEDULER".to_string(), "simulated".to_string());
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        RuntimeContext::new(now, Platform::Linux, env, home.to_path_buf())
    }

    #[test]
    fn test_not_installed() {
        let temp = TempDir::new().unwrap();
        let report = collect_status(&context(temp.path())).unwrap();
        assert!(matches!(report, StatusReport::NotInstalled));
    }

    #[test]
    fn test_health() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(health(None, today), BackupHealth::NoBackups);

        assert_eq!(health(NaiveDate::from_ymd_opt(2026, 1, 12), today), BackupHealth::Recent);
        assert_eq!(health(NaiveDate::from_ymd_opt(2026, 1, 11), today), BackupHealth::Stale);
    }

    #[test]
    fn test_installed_summary() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        let paths = ConfigPaths::resolve(&ctx);
        let mut settings = Settings::default();
        settings.backup.local_path = temp.path().join("backups").display().to_string();
        settings.save(&paths).unwrap();

        let daily = temp.path().join("backups/daily");
        fs::create_dir_all(&daily).unwrap();
        fs::write(daily.join("zen-backup-daily-2026-01-14.tar.gz"), vec![0u8; 100]).unwrap();
        fs::write(daily.join("zen-backup-daily-2026-01-15.tar.gz"), vec![0u8; 50]).unwrap();

        let StatusReport::Installed(status) = collect_status(&ctx).unwrap() else {
            panic!("expected an installed status");
        };
        let BackupDirState::Present(summary) = &status.backup_dir else {
            panic!("expected a backup directory");
        };
        assert_eq!(
            summary.latest_daily.as_ref().map(|a| a.name.as_str()),
            Some("zen-backup-daily-2026-01-15.tar.gz")
        );
        assert!(summary.latest_weekly.is_none());
        assert_eq!(summary.daily_bytes, 150);
        assert_eq!(summary.total_bytes(), 150);
        assert_eq!(summary.health, BackupHealth::Recent);
        assert!(status.scheduler.all(JobState::NotInstalled));
    }

    #[test]
    fn test_missing_backup_dir() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        let mut settings = Settings::default();
        settings.backup.local_path = temp.path().join("nowhere").display().to_string();
        settings.save(&ConfigPaths::resolve(&ctx)).unwrap();

        let StatusReport::Installed(status) = collect_status(&ctx).unwrap() else {
            panic!("expected an installed status");
        };
        assert_eq!(status.backup_dir, BackupDirState::Missing);
        assert!(status.recent_log.is_empty());
    }
}
