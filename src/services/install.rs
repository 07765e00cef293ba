//! Install service
//!
//! Writes a settings file with detected defaults (unless one exists) and
//! installs both scheduled jobs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{ConfigPaths, Settings};
use crate::context::{Platform, RuntimeContext};
use crate::error::BackupResult;
use crate::models::SchedulerStatus;
use crate::scheduler::PlatformScheduler;

/// What `install` did
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Profile found on disk (or given by override); `None` if nothing was found
    pub detected_profile: Option<PathBuf>,
    /// Cloud folder that will receive copies
    pub cloud_path: Option<PathBuf>,
    pub settings_path: PathBuf,
    /// False when an existing settings file was kept
    pub settings_written: bool,
    pub scheduler: SchedulerStatus,
}

/// Install the agent: settings first, then the scheduled jobs running `executable`
pub fn install(ctx: &RuntimeContext, executable: &Path) -> BackupResult<InstallReport> {
    let paths = ConfigPaths::resolve(ctx);
    let detected_profile = detect_profile_path(ctx);

    let (settings, settings_written) = match Settings::load(&paths)? {
        Some(existing) => (existing, false),
        None => {
            let mut settings = Settings::default();
            if let Some(profile) = &detected_profile {
                settings.profile.path = profile.display().to_string();
            }
            settings.backup.cloud_path =
                detect_cloud_path(ctx).map(|p| p.display().to_string());
            settings.save(&paths)?;
            info!(path = %paths.settings_file().display(), "settings written");
            (settings, true)
        }
    };

    let config = settings.resolve(ctx, &paths)?;
    let scheduler = PlatformScheduler::for_context(ctx).install(&config, executable)?;

    Ok(InstallReport {
        detected_profile,
        cloud_path: config.cloud_root.clone(),
        settings_path: paths.settings_file().to_path_buf(),
        settings_written,
        scheduler,
    })
}

/// `ZEN_BACKUP_PROFILE_PATH`, else the first platform default that exists
pub fn detect_profile_path(ctx: &RuntimeContext) -> Option<PathBuf> {
    if let Some(custom) = ctx.var("ZEN_BACKUP_PROFILE_PATH") {
        return Some(ctx.cwd.join(custom));
    }

    let home = ctx.home_dir();
    let candidates = match ctx.platform {
        Platform::MacOs => vec![home
            .join("Library")
            .join("Application Support")
            .join("zen")
            .join("Profiles")
            .join("default")],
        Platform::Linux => vec![
            home.join(".zen").join("default"),
            home.join(".config").join("zen").join("default"),
        ],
        Platform::Windows => vec![ctx
            .app_data_dir()
            .join("zen")
            .join("Profiles")
            .join("default")],
    };
    candidates.into_iter().find(|candidate| candidate.is_dir())
}

/// Cloud folder for copies.
///
/// `ZEN_BACKUP_CLOUD=none` turns cloud copies off and
/// `ZEN_BACKUP_CLOUD_CUSTOM` names a folder; otherwise the first synced
/// folder found for the platform is used.
pub fn detect_cloud_path(ctx: &RuntimeContext) -> Option<PathBuf> {
    if ctx.var("ZEN_BACKUP_CLOUD") == Some("none") {
        return None;
    }
    if let Some(custom) = ctx.var("ZEN_BACKUP_CLOUD_CUSTOM") {
        return Some(ctx.cwd.join(custom));
    }

    let home = ctx.home_dir();
    let candidates = match ctx.platform {
        Platform::MacOs => {
            let storage = home.join("Library").join("CloudStorage");
            let mut candidates: Vec<PathBuf> = google_drive_mounts(&storage)
                .into_iter()
                .map(|mount| mount.join("My Drive"))
                .collect();
            candidates.push(
                home.join("Library")
                    .join("Mobile Documents")
                    .join("com~apple~CloudDocs"),
            );
            candidates.push(storage.join("OneDrive-Personal"));
            candidates.push(home.join("Dropbox"));
            candidates
        }
        Platform::Linux => vec![home.join("google-drive"), home.join("Dropbox")],
        Platform::Windows => vec![
            home.join("Google Drive").join("My Drive"),
            home.join("OneDrive"),
            home.join("Dropbox"),
        ],
    };
    candidates.into_iter().find(|candidate| candidate.is_dir())
}

/// `GoogleDrive-<account>` folders under macOS's CloudStorage, sorted
fn google_drive_mounts(storage: &Path) -> Vec<PathBuf> {
    let mut mounts: Vec<PathBuf> = fs::read_dir(storage)
        .into_iter()
        .flatten()
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("GoogleDrive-"))
        .map(|entry| entry.path())
        .collect();
    mounts.sort();
    mounts
}
