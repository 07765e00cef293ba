//! Scheduled job states

use std::fmt;

use serde::Serialize;

use super::kind::BackupKind;

/// Lifecycle state of one scheduled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    NotInstalled,
    Active,
    Paused,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::NotInstalled => write!(f, "not_installed"),
            JobState::Active => write!(f, "active"),
            JobState::Paused => write!(f, "paused"),
        }
    }
}

/// State of one job, with its platform label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub kind: BackupKind,
    pub label: String,
    pub state: JobState,
}

/// Query result covering both jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub jobs: Vec<JobStatus>,
}

impl SchedulerStatus {
    /// State of the job for `kind`
    pub fn state(&self, kind: BackupKind) -> JobState {
        self.jobs
            .iter()
            .find(|job| job.kind == kind)
            .map(|job| job.state)
            .unwrap_or(JobState::NotInstalled)
    }

    /// True when at least one job has a definition
    pub fn any_installed(&self) -> bool {
        self.jobs
            .iter()
            .any(|job| job.state != JobState::NotInstalled)
    }

    /// True when every job is in `state`
    pub fn all(&self, state: JobState) -> bool {
        !self.jobs.is_empty() && self.jobs.iter().all(|job| job.state == state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(daily: JobState, weekly: JobState) -> SchedulerStatus {
        SchedulerStatus {
            jobs: vec![
                JobStatus {
                    kind: BackupKind::Daily,
                    label: "d".into(),
                    state: daily,
                },
                JobStatus {
                    kind: BackupKind::Weekly,
                    label: "w".into(),
                    state: weekly,
                },
            ],
        }
    }

    #[test]
    fn test_state_lookup() {
        let s = status(JobState::Active, JobState::Paused);
        assert_eq!(s.state(BackupKind::Daily), JobState::Active);
        assert_eq!(s.state(BackupKind::Weekly), JobState::Paused);
        assert!(s.any_installed());
        assert!(!s.all(JobState::Active));
    }

    #[test]
    fn test_not_installed() {
        let s = status(JobState::NotInstalled, JobState::NotInstalled);
        assert!(!s.any_installed());
        assert!(s.all(JobState::NotInstalled));
        assert_eq!(JobState::NotInstalled.to_string(), "not_installed");
    }
}
