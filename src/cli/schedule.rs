//! Schedule CLI command

use crate::context::RuntimeContext;
use crate::error::BackupResult;
use crate::models::SchedulerStatus;
use crate::services::{run_schedule, ScheduleAction};

/// Handle `schedule <start|resume|stop|pause|status>`
pub fn handle_schedule_command(ctx: &RuntimeContext, action: ScheduleAction) -> BackupResult<()> {
    let status = run_schedule(ctx, action)?;

    match action {
        ScheduleAction::Start => println!("Scheduled backups started."),
        ScheduleAction::Stop => println!("Scheduled backups stopped."),
        ScheduleAction::Status => {}
    }
    for line in format_jobs(&status) {
        println!("{}", line);
    }
    Ok(())
}

/// One `label: state` line per installed job
pub fn format_jobs(status: &SchedulerStatus) -> Vec<String> {
    if !status.any_installed() {
        return vec!["No scheduled jobs.".to_string()];
    }
    status
        .jobs
        .iter()
        .map(|job| format!("{}: {}", job.label, job.state))
        .collect()
}
