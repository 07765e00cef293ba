//! Backup CLI commands
//!
//! Implements `backup`, `restore` and `list`.

use crate::archive::format_size;
use crate::config::BackupConfig;
use crate::context::RuntimeContext;
use crate::error::BackupResult;
use crate::models::BackupKind;
use crate::services::{list_backups, restore_profile, BackupService};

/// Handle `backup <daily|weekly>`
pub fn handle_backup_command(ctx: &RuntimeContext, kind: BackupKind) -> BackupResult<()> {
    let config = BackupConfig::load(ctx)?;
    let report = BackupService::new(&config, ctx).run(kind)?;

    println!("Created {} backup: {}", kind, report.archive_path.display());
    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    if !report.pruned.is_empty() {
        println!(
            "Removed {} expired {} backup(s).",
            report.pruned.len(),
            kind
        );
    }
    if let Some(copy) = &report.cloud_copy {
        println!("Cloud copy: {}", copy.display());
    }

    // The local archive stands; the failed cloud copy still fails the command
    match report.cloud_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Handle `restore <archive>`
pub fn handle_restore_command(ctx: &RuntimeContext, archive: &str) -> BackupResult<()> {
    let config = BackupConfig::load(ctx)?;
    let outcome = restore_profile(archive, &config, ctx)?;

    println!("Restored from archive: {}", outcome.archive_path.display());
    println!("Pre-restore backup: {}", outcome.pre_restore_path.display());

    if outcome.integrity_failures.is_empty() {
        return Ok(());
    }

    eprintln!(
        "Warning: {} database(s) in the restored profile failed the integrity check.",
        outcome.integrity_failures.len()
    );
    eprintln!(
        "The previous profile is still at {}.",
        outcome.pre_restore_path.display()
    );
    let mut failures = outcome.integrity_failures.into_iter();
    match failures.next() {
        Some(first) => {
            for other in failures {
                eprintln!("  {}", other);
            }
            Err(first)
        }
        None => Ok(()),
    }
}

/// Handle `list`
pub fn handle_list_command(ctx: &RuntimeContext) -> BackupResult<()> {
    let config = BackupConfig::load(ctx)?;
    let archives = list_backups(&config)?;

    if archives.is_empty() {
        println!("No backups found (empty backup directory).");
        return Ok(());
    }

    for kind in BackupKind::ALL {
        println!("{}:", kind);
        for archive in archives.iter().filter(|a| a.kind == kind) {
            println!("  {} ({})", archive.name, format_size(archive.size_bytes));
        }
    }

    Ok(())
}
