//! Status CLI command

use crate::archive::format_size;
use crate::context::RuntimeContext;
use crate::error::{BackupError, BackupResult};
use crate::models::{BackupKind, JobState, SchedulerStatus};
use crate::services::status::{BackupDirState, BackupHealth, InstalledStatus};
use crate::services::{collect_status, StatusReport};

/// Handle `status`
pub fn handle_status_command(ctx: &RuntimeContext) -> BackupResult<()> {
    match collect_status(ctx)? {
        StatusReport::NotInstalled => {
            println!("Not installed");
            println!("Run \"zen-backup install\" to configure backups.");
            Ok(())
        }
        StatusReport::Installed(status) => {
            for line in format_status(&status) {
                println!("{}", line);
            }
            if status.backup_dir == BackupDirState::Unreadable {
                return Err(BackupError::Io("Backup directory is not readable.".into()));
            }
            Ok(())
        }
    }
}

/// Status report as output lines
pub fn format_status(status: &InstalledStatus) -> Vec<String> {
    let config = &status.config;
    let mut lines = vec![
        "Zen Profile Backup Status".to_string(),
        format!("Profile path: {}", config.profile_path.display()),
        format!("Backup directory: {}", config.backup_root.display()),
        match &config.cloud_root {
            Some(cloud) => format!("Cloud sync: enabled ({})", cloud.display()),
            None => "Cloud sync: local only".to_string(),
        },
        format!(
            "Retention: daily {} days, weekly {} days",
            config.retention.daily_days, config.retention.weekly_days
        ),
    ];

    match &status.backup_dir {
        BackupDirState::Missing => lines.push(
            "Backup directory not found. Run a backup or check configuration.".to_string(),
        ),
        BackupDirState::Unreadable => lines.push("Backup directory permission error.".to_string()),
        BackupDirState::Present(summary) => {
            for kind in BackupKind::ALL {
                lines.push(match summary.latest(kind) {
                    Some(archive) => format!(
                        "Latest {}: {} ({})",
                        kind,
                        archive.name,
                        format_size(archive.size_bytes)
                    ),
                    None => format!("No {} backups yet", kind),
                });
            }
            lines.push(format!("Disk usage total: {}", format_size(summary.total_bytes())));
            lines.push(format!("Disk usage daily: {}", format_size(summary.daily_bytes)));
            lines.push(format!("Disk usage weekly: {}", format_size(summary.weekly_bytes)));
            lines.push(
                match summary.health {
                    BackupHealth::NoBackups => "No backups yet. Run a backup.",
                    BackupHealth::Recent => "Health: recent daily backup exists.",
                    BackupHealth::Stale => "Warning: latest daily backup is stale.",
                }
                .to_string(),
            );
        }
    }

    lines.extend(format_scheduler_summary(&status.scheduler));

    if !status.recent_log.is_empty() {
        lines.push("Recent activity:".to_string());
        lines.extend(status.recent_log.iter().map(|entry| format!("  {}", entry)));
    }

    lines
}

fn format_scheduler_summary(scheduler: &SchedulerStatus) -> Vec<String> {
    if !scheduler.any_installed() {
        return vec!["Scheduled jobs: not installed".to_string()];
    }

    let overall = if scheduler.all(JobState::Active) {
        "active"
    } else if scheduler.all(JobState::Paused) {
        "paused"
    } else {
        "mixed"
    };
    let mut lines = vec![format!("Scheduled jobs: {}", overall)];
    lines.extend(
        scheduler
            .jobs
            .iter()
            .map(|job| format!("- {}: {}", job.label, job.state)),
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;

    fn scheduler(daily: JobState, weekly: JobState) -> SchedulerStatus {
        SchedulerStatus {
            jobs: vec![
                JobStatus {
                    kind: BackupKind::Daily,
                    label: "zen-backup-daily.timer".into(),
                    state: daily,
                },
                JobStatus {
                    kind: BackupKind::Weekly,
                    label: "zen-backup-weekly.timer".into(),
                    state: weekly,
                },
            ],
        }
    }

    #[test]
    fn test_scheduler_summary() {
        assert_eq!(
            format_scheduler_summary(&scheduler(JobState::NotInstalled, JobState::NotInstalled)),
            vec!["Scheduled jobs: not installed"]
        );
        assert_eq!(
            format_scheduler_summary(&scheduler(JobState::Active, JobState::Active)),
            vec![
                "Scheduled jobs: active",
                "- zen-backup-daily.timer: active",
                "- zen-backup-weekly.timer: active"
            ]
        );
        assert_eq!(
            format_scheduler_summary(&scheduler(JobState::Paused, JobState::Active))[0],
            "Scheduled jobs: mixed"
        );
    }
}
