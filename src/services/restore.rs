//! Restore service
//!
//! Wraps the restore engine with the backup log: a successful swap is
//! recorded as a RESTORE line, databases that fail their check afterwards as
//! ERROR lines.

use tracing::warn;

use crate::audit::{BackupLog, LogLevel};
use crate::config::BackupConfig;
use crate::context::RuntimeContext;
use crate::error::BackupResult;
use crate::restore::{restore, RestoreOutcome};

/// Restore the configured profile from `archive` and log the result
pub fn restore_profile(
    archive: &str,
    config: &BackupConfig,
    ctx: &RuntimeContext,
) -> BackupResult<RestoreOutcome> {
    let outcome = restore(archive, config, ctx)?;

    let log = BackupLog::new(&config.backup_root);
    let name = outcome
        .archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| outcome.archive_path.display().to_string());

    let mut lines = vec![(LogLevel::Restore, format!("restored profile from {}", name))];
    lines.extend(
        outcome
            .integrity_failures
            .iter()
            .map(|failure| (LogLevel::Error, failure.to_string())),
    );
    for (level, message) in lines {
        if let Err(e) = log.append(ctx.now, level, message) {
            warn!(error = %e, "failed to write backup log");
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigPaths, Settings};
    use crate::context::Platform;
    use crate::services::backup::BackupService;
    use crate::models::BackupKind;
    use crate::notify::DisabledNotifier;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_restore_logs_line() {
        let temp = TempDir::new().unwrap();
        let home = temp.path();
        let profile = home.join("profile");
        fs::create_dir_all(&profile).unwrap();
        fs::write(profile.join("prefs.js"), "original").unwrap();

        let mut env = BTreeMap::new();
        env.insert("HOME".to_string(), home.display().to_string());
        env.insert("ZEN_BACKUP_BROWSER_RUNNING".to_string(), "0".to_string());
        let ctx = RuntimeContext::new(Utc::now(), Platform::Linux, env, home.to_path_buf());

        let mut settings = Settings::default();
        settings.profile.path = profile.display().to_string();
        settings.backup.local_path = home.join("backups").display().to_string();
        let config = settings
            .resolve(&ctx, &ConfigPaths::with_settings_file(home.join("settings.toml")))
            .unwrap();

        let report = BackupService::with_notifier(&config, &ctx, Box::new(DisabledNotifier))
            .run(BackupKind::Daily)
            .unwrap();
        fs::write(profile.join("prefs.js"), "changed").unwrap();

        let name = report
            .archive_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        let outcome = restore_profile(&name, &config, &ctx).unwrap();

        assert!(outcome.integrity_failures.is_empty());
        assert_eq!(fs::read_to_string(profile.join("prefs.js")).unwrap(), "original");
        assert_eq!(
            fs::read_to_string(outcome.pre_restore_path.join("prefs.js")).unwrap(),
            "changed"
        );

        let log = fs::read_to_string(home.join("backups/backup.log")).unwrap();
        assert!(log.contains(&format!("RESTORE: restored profile from {}", name)));
    }
}
