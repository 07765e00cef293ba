//! Core data models for zen-backup
//!
//! This module contains the small value types shared by the archive engine,
//! the retention pruner and the scheduler: backup kinds, schedule times and
//! scheduled-job states.

pub mod job;
pub mod kind;
pub mod schedule;

pub use job::{JobState, JobStatus, SchedulerStatus};
pub use kind::BackupKind;
pub use schedule::{JobSchedule, ScheduleTime};
