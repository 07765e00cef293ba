//! Install and uninstall CLI commands

use std::path::Path;

use crate::context::RuntimeContext;
use crate::error::BackupResult;
use crate::services::{install, uninstall};

/// Handle `install`
pub fn handle_install_command(ctx: &RuntimeContext, executable: &Path) -> BackupResult<()> {
    let report = install(ctx, executable)?;

    match &report.detected_profile {
        Some(profile) => println!("Detected profile path: {}", profile.display()),
        None => {
            println!("No Zen profile detected.");
            println!(
                "Set profile.path in {} to your profile directory.",
                report.settings_path.display()
            );
        }
    }
    match &report.cloud_path {
        Some(cloud) => println!("Cloud sync folder: {}", cloud.display()),
        None => println!("Cloud sync: local only"),
    }
    if report.settings_written {
        println!("Settings written: {}", report.settings_path.display());
    } else {
        println!("Using existing settings: {}", report.settings_path.display());
    }

    println!("Scheduler installed.");
    for job in &report.scheduler.jobs {
        println!("{}", job.label);
    }
    Ok(())
}

/// Handle `uninstall [--purge-backups]`
pub fn handle_uninstall_command(ctx: &RuntimeContext, purge_backups: bool) -> BackupResult<()> {
    let report = uninstall(ctx, purge_backups)?;

    if report.purged.is_some() {
        println!("Backup archives removed.");
    } else if report.kept.is_some() {
        eprintln!(
            "Backup archives were left in place. Re-run with --purge-backups to remove them and free disk space."
        );
    }
    println!("Scheduled jobs removed.");
    println!("Settings removed.");
    Ok(())
}
