//! User settings for zen-backup
//!
//! The settings file is TOML. It is loaded fresh for every command, expanded
//! and validated into a `BackupConfig`, and never mutated afterwards.

use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::paths::{expand_path, ConfigPaths};
use crate::context::RuntimeContext;
use crate::error::{BackupError, BackupResult};
use crate::models::schedule::{parse_weekday, weekday_name};
use crate::models::{BackupKind, JobSchedule, ScheduleTime};

/// `[profile]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSettings {
    #[serde(default = "default_profile_path")]
    pub path: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            path: default_profile_path(),
        }
    }
}

/// `[backup]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSettings {
    #[serde(default = "default_local_path")]
    pub local_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_path: Option<String>,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            local_path: default_local_path(),
            cloud_path: None,
        }
    }
}

/// `[retention]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSettings {
    /// Maximum age of a daily archive, in days
    #[serde(default = "default_daily_days")]
    pub daily_days: u32,
    /// Maximum age of a weekly archive, in days
    #[serde(default = "default_weekly_days")]
    pub weekly_days: u32,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            daily_days: default_daily_days(),
            weekly_days: default_weekly_days(),
        }
    }
}

/// `[schedule]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_daily_time")]
    pub daily_time: String,
    #[serde(default = "default_weekly_day")]
    pub weekly_day: String,
    #[serde(default = "default_weekly_time")]
    pub weekly_time: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            daily_time: default_daily_time(),
            weekly_day: default_weekly_day(),
            weekly_time: default_weekly_time(),
        }
    }
}

/// `[notifications]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Settings file contents, as written by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub profile: ProfileSettings,
    #[serde(default)]
    pub backup: BackupSettings,
    #[serde(default)]
    pub retention: RetentionSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

fn default_profile_path() -> String {
    "~/.zen".to_string()
}

fn default_local_path() -> String {
    "~/zen-backups".to_string()
}

fn default_daily_days() -> u32 {
    30
}

fn default_weekly_days() -> u32 {
    84
}

fn default_daily_time() -> String {
    "12:30".to_string()
}

fn default_weekly_day() -> String {
    weekday_name(Weekday::Sun).to_string()
}

fn default_weekly_time() -> String {
    "02:00".to_string()
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Load settings from disk; `None` if the file doesn't exist
    pub fn load(paths: &ConfigPaths) -> BackupResult<Option<Self>> {
        let settings_path = paths.settings_file();
        if !settings_path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(settings_path)
            .map_err(|e| BackupError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = toml::from_str(&contents)
            .map_err(|e| BackupError::Config(format!("config parse error: {}", e)))?;

        Ok(Some(settings))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ConfigPaths) -> BackupResult<()> {
        paths.ensure_directories()?;

        let contents = toml::to_string_pretty(self)
            .map_err(|e| BackupError::Toml(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| BackupError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Expand and validate into an immutable configuration snapshot
    pub fn resolve(&self, ctx: &RuntimeContext, paths: &ConfigPaths) -> BackupResult<BackupConfig> {
        let config_dir = paths.config_dir();
        let base = Some(config_dir.as_path());

        let profile_path = non_empty(&self.profile.path, "profile.path")?;
        let local_path = non_empty(&self.backup.local_path, "backup.local_path")?;
        let cloud_root = self
            .backup
            .cloud_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| expand_path(p, ctx, base));

        let daily_time: ScheduleTime = self.schedule.daily_time.parse()?;
        let weekly_time: ScheduleTime = self.schedule.weekly_time.parse()?;
        let weekly_day = parse_weekday(&self.schedule.weekly_day)?;

        Ok(BackupConfig {
            profile_path: expand_path(profile_path, ctx, base),
            backup_root: expand_path(local_path, ctx, base),
            cloud_root,
            retention: Retention {
                daily_days: self.retention.daily_days,
                weekly_days: self.retention.weekly_days,
            },
            daily_schedule: JobSchedule {
                time: daily_time,
                weekday: None,
            },
            weekly_schedule: JobSchedule {
                time: weekly_time,
                weekday: Some(weekly_day),
            },
            notifications_enabled: self.notifications.enabled,
            config_path: paths.settings_file().to_path_buf(),
        })
    }
}

fn non_empty<'a>(value: &'a str, key: &str) -> BackupResult<&'a str> {
    if value.trim().is_empty() {
        return Err(BackupError::Config(format!(
            "{} must be a non-empty string",
            key
        )));
    }
    Ok(value)
}

/// Per-kind retention periods, in days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub daily_days: u32,
    pub weekly_days: u32,
}

/// Read-only configuration snapshot for one command
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub profile_path: PathBuf,
    pub backup_root: PathBuf,
    pub cloud_root: Option<PathBuf>,
    pub retention: Retention,
    pub daily_schedule: JobSchedule,
    pub weekly_schedule: JobSchedule,
    pub notifications_enabled: bool,
    /// Where this snapshot was loaded from
    pub config_path: PathBuf,
}

impl BackupConfig {
    /// Load the configuration, failing if no settings file exists
    pub fn load(ctx: &RuntimeContext) -> BackupResult<Self> {
        let paths = ConfigPaths::resolve(ctx);
        Self::load_optional(ctx)?
            .ok_or_else(|| BackupError::config_not_found(paths.settings_file().display().to_string()))
    }

    /// Load the configuration if a settings file exists
    pub fn load_optional(ctx: &RuntimeContext) -> BackupResult<Option<Self>> {
        let paths = ConfigPaths::resolve(ctx);
        match Settings::load(&paths)? {
            Some(settings) => settings.resolve(ctx, &paths).map(Some),
            None => Ok(None),
        }
    }

    /// Retention period for `kind`
    pub fn retention_days(&self, kind: BackupKind) -> u32 {
        match kind {
            BackupKind::Daily => self.retention.daily_days,
            BackupKind::Weekly => self.retention.weekly_days,
        }
    }

    /// Schedule for the job of `kind`
    pub fn schedule(&self, kind: BackupKind) -> JobSchedule {
        match kind {
            BackupKind::Daily => self.daily_schedule,
            BackupKind::Weekly => self.weekly_schedule,
        }
    }

    /// Path of the backup log inside the backup root
    pub fn log_path(&self) -> PathBuf {
        self.backup_root.join(crate::audit::LOG_FILE_NAME)
    }

    /// Directory for archives of `kind` under `root`
    pub fn kind_dir(root: &Path, kind: BackupKind) -> PathBuf {
        root.join(kind.as_str())
    }
}
