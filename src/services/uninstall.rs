//! Uninstall service
//!
//! Removes the scheduled jobs and the settings file. Backup archives are
//! kept unless purging is asked for. Nothing here stops on a failure: a
//! facility or file that is already gone must not block teardown.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::config::{BackupConfig, ConfigPaths};
use crate::context::RuntimeContext;
use crate::error::BackupResult;
use crate::scheduler::PlatformScheduler;

/// What `uninstall` removed
#[derive(Debug, Clone)]
pub struct UninstallReport {
    /// Backup root that was deleted, when purging
    pub purged: Option<PathBuf>,
    /// Backup root left in place
    pub kept: Option<PathBuf>,
    pub settings_removed: bool,
}

/// Tear the agent down. `purge_backups` (or `ZEN_BACKUP_PURGE_BACKUPS=1`)
/// also deletes the backup root.
pub fn uninstall(ctx: &RuntimeContext, purge_backups: bool) -> BackupResult<UninstallReport> {
    let purge_backups = purge_backups || ctx.flag("ZEN_BACKUP_PURGE_BACKUPS");

    let config = match BackupConfig::load_optional(ctx) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "settings unreadable, removing anyway");
            None
        }
    };

    if let Err(e) = PlatformScheduler::for_context(ctx).uninstall() {
        warn!(error = %e, "scheduler uninstall failed");
    }

    let settings_file = ConfigPaths::resolve(ctx).settings_file().to_path_buf();
    let settings_removed = settings_file.exists() && fs::remove_file(&settings_file).is_ok();

    let mut report = UninstallReport {
        purged: None,
        kept: None,
        settings_removed,
    };

    if let Some(config) = config {
        let root = config.backup_root;
        if purge_backups {
            if root.exists() {
                if let Err(e) = fs::remove_dir_all(&root) {
                    warn!(root = %root.display(), error = %e, "failed to remove backups");
                }
            }
            report.purged = Some(root);
        } else {
            report.kept = Some(root);
        }
    }

    Ok(report)
}
