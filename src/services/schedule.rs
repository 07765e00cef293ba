//! Schedule service
//!
//! Pauses, resumes and reports the scheduled jobs without touching their
//! definitions.

use std::fmt;
use std::str::FromStr;

use crate::context::RuntimeContext;
use crate::error::{BackupError, BackupResult};
use crate::models::SchedulerStatus;
use crate::scheduler::PlatformScheduler;

/// A `schedule` subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    Start,
    Stop,
    Status,
}

impl fmt::Display for ScheduleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleAction::Start => write!(f, "start"),
            ScheduleAction::Stop => write!(f, "stop"),
            ScheduleAction::Status => write!(f, "status"),
        }
    }
}

impl FromStr for ScheduleAction {
    type Err = BackupError;

    /// `resume` and `pause` are accepted as `start` and `stop`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "resume" => Ok(ScheduleAction::Start),
            "stop" | "pause" => Ok(ScheduleAction::Stop),
            "status" => Ok(ScheduleAction::Status),
            _ => Err(BackupError::Precondition(
                "schedule action must be start|resume|stop|pause|status".to_string(),
            )),
        }
    }
}

/// Apply `action` to the scheduled jobs and report their state afterwards
pub fn run_schedule(ctx: &RuntimeContext, action: ScheduleAction) -> BackupResult<SchedulerStatus> {
    let scheduler = PlatformScheduler::for_context(ctx);
    match action {
        ScheduleAction::Start => scheduler.start(),
        ScheduleAction::Stop => scheduler.stop(),
        ScheduleAction::Status => scheduler.query(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Platform;
    use crate::models::JobState;
    use crate::services::install::install;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_parse_action() {
        assert_eq!("resume".parse::<ScheduleAction>().unwrap(), ScheduleAction::Start);
        assert_eq!("PAUSE".parse::<ScheduleAction>().unwrap(), ScheduleAction::Stop);
        assert_eq!("status".parse::<ScheduleAction>().unwrap(), ScheduleAction::Status);
        assert!("restart".parse::<ScheduleAction>().is_err());
    }

    #[test]
    fn test_pause_and_resume() {
        let temp = TempDir::new().unwrap();
        let mut env = BTreeMap::new();
        env.insert("HOME".to_string(), temp.path().display().to_string());
        env.insert("ZEN_BACKUP_SCHEDULER".to_string(), "simulated".to_string());
        env.insert("ZEN_BACKUP_CLOUD".to_string(), "none".to_string());
        let ctx = RuntimeContext::new(Utc::now(), Platform::Windows, env, temp.path().to_path_buf());

        assert!(run_schedule(&ctx, ScheduleAction::Stop)
            .unwrap()
            .all(JobState::NotInstalled));

        install(&ctx, &temp.path().join("zen-backup.exe")).unwrap();
        assert!(run_schedule(&ctx, ScheduleAction::Stop).unwrap().all(JobState::Paused));
        assert!(run_schedule(&ctx, ScheduleAction::Status).unwrap().all(JobState::Paused));
        assert!(run_schedule(&ctx, ScheduleAction::Start).unwrap().all(JobState::Active));
    }
}
