//! Windows Task Scheduler
//!
//! Tasks are created with `schtasks`. The task definition is also kept as a
//! JSON file under `%APPDATA%\zen-profile-backup\task-scheduler`, which is
//! what decides whether a job counts as installed.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::control::{select_control_plane, ControlPlane};
use super::{HostJobFacts, JobSpec, SchedulerBackend};
use crate::config::paths::APP_DIR_NAME;
use crate::context::RuntimeContext;
use crate::error::{BackupError, BackupResult};
use crate::models::schedule::weekday_abbrev;
use crate::models::BackupKind;

pub const DAILY_TASK: &str = "ZenBackupDaily";
pub const WEEKLY_TASK: &str = "ZenBackupWeekly";

const SCHTASKS: &str = "schtasks";

/// Persisted form of one task definition
#[derive(Debug, Serialize)]
struct TaskDefinition {
    task_name: String,
    kind: BackupKind,
    schedule: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    day: Option<String>,
    start_time: String,
    command: String,
    log_path: String,
}

pub struct TaskScheduler {
    task_dir: PathBuf,
    control: Box<dyn ControlPlane>,
}

impl TaskScheduler {
    pub fn new(ctx: &RuntimeContext) -> Self {
        let control = select_control_plane(ctx, SCHTASKS, &["/Query".to_string()]);
        Self {
            task_dir: task_dir(&ctx.app_data_dir()),
            control,
        }
    }

    pub fn with_control(app_data: &Path, control: Box<dyn ControlPlane>) -> Self {
        Self {
            task_dir: task_dir(app_data),
            control,
        }
    }

    fn definition_path(&self, kind: BackupKind) -> PathBuf {
        self.task_dir.join(format!("{}.json", task_name(kind)))
    }

    fn schtasks(&self, args: &[&str]) -> BackupResult<()> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.control.run_checked(SCHTASKS, &args)?;
        Ok(())
    }
}

fn task_dir(app_data: &Path) -> PathBuf {
    app_data.join(APP_DIR_NAME).join("task-scheduler")
}

pub fn task_name(kind: BackupKind) -> &'static str {
    match kind {
        BackupKind::Daily => DAILY_TASK,
        BackupKind::Weekly => WEEKLY_TASK,
    }
}

/// The `/TR` command line: every argument double-quoted
fn task_command(job: &JobSpec) -> String {
    std::iter::once(job.executable.display().to_string())
        .chain(job.arguments())
        .map(|arg| format!("\"{}\"", arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn definition(job: &JobSpec) -> TaskDefinition {
    TaskDefinition {
        task_name: task_name(job.kind).to_string(),
        kind: job.kind,
        schedule: if job.schedule.weekday.is_some() {
            "WEEKLY"
        } else {
            "DAILY"
        },
        day: job
            .schedule
            .weekday
            .map(|day| weekday_abbrev(day).to_ascii_uppercase()),
        start_time: job.schedule.time.to_string(),
        command: task_command(job),
        log_path: job.log_path.display().to_string(),
    }
}

impl SchedulerBackend for TaskScheduler {
    fn control(&self) -> &dyn ControlPlane {
        self.control.as_ref()
    }

    fn definition_dir(&self) -> &Path {
        &self.task_dir
    }

    fn job_name(&self, kind: BackupKind) -> String {
        task_name(kind).to_string()
    }

    fn definition_files(&self, kind: BackupKind) -> Vec<PathBuf> {
        vec![self.definition_path(kind)]
    }

    fn render_definitions(&self, job: &JobSpec) -> BackupResult<Vec<(PathBuf, String)>> {
        let contents = serde_json::to_string_pretty(&definition(job))?;
        Ok(vec![(self.definition_path(job.kind), contents)])
    }

    fn register(&self, job: &JobSpec) -> BackupResult<()> {
        let def = definition(job);
        let mut args = vec!["/Create", "/F", "/TN", def.task_name.as_str(), "/SC", def.schedule];
        if let Some(day) = def.day.as_deref() {
            args.extend(["/D", day]);
        }
        args.extend(["/ST", def.start_time.as_str(), "/TR", def.command.as_str()]);
        self.schtasks(&args)
    }

    fn deregister(&self, kind: BackupKind) -> BackupResult<()> {
        self.schtasks(&["/Delete", "/TN", task_name(kind), "/F"])
    }

    fn enable(&self, kind: BackupKind) -> BackupResult<()> {
        self.schtasks(&["/Change", "/TN", task_name(kind), "/ENABLE"])
    }

    fn disable(&self, kind: BackupKind) -> BackupResult<()> {
        self.schtasks(&["/Change", "/TN", task_name(kind), "/DISABLE"])
    }

    fn host_facts(&self, kind: BackupKind) -> BackupResult<HostJobFacts> {
        let args: Vec<String> = ["/Query", "/TN", task_name(kind), "/FO", "LIST", "/V"]
            .iter()
            .map(|arg| arg.to_string())
            .collect();
        let outcome = self.control.run(SCHTASKS, &args)?;
        if !outcome.success {
            // The facility answered: the task is not registered
            return Ok(HostJobFacts {
                enabled: false,
                loaded: false,
            });
        }

        let state = parse_task_state(&outcome.stdout).ok_or_else(|| {
            BackupError::Scheduler(format!("no task state in schtasks output for {}", task_name(kind)))
        })?;
        Ok(HostJobFacts {
            enabled: !state.eq_ignore_ascii_case("disabled"),
            loaded: true,
        })
    }
}

/// Pull the task state (`Ready`, `Running`, `Disabled`, ...) out of
/// `schtasks /Query /FO LIST /V` output
fn parse_task_state(output: &str) -> Option<String> {
    let value_of = |key: &str| {
        output.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case(key) {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
    };
    value_of("Scheduled Task State")
        .filter(|state| !state.is_empty())
        .or_else(|| value_of("Status"))
        .filter(|state| !state.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Platform;
    use crate::scheduler::tests::{test_config, test_context};
    use crate::scheduler::SimulatedControlPlane;
    use tempfile::TempDir;

    #[test]
    fn test_render_weekly_definition() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path(), Platform::Windows);
        let config = test_config(&ctx);
        let backend = TaskScheduler::with_control(&ctx.app_data_dir(), Box::new(SimulatedControlPlane::new()));
        let job = JobSpec::new(&config, BackupKind::Weekly, Path::new("/opt/zen-backup.exe"));

        let rendered = backend.render_definitions(&job).unwrap();
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].0.ends_with("zen-profile-backup/task-scheduler/ZenBackupWeekly.json"));

        let value: serde_json::Value = serde_json::from_str(&rendered[0].1).unwrap();
        assert_eq!(value["task_name"], "ZenBackupWeekly");
        assert_eq!(value["kind"], "weekly");
        assert_eq!(value["schedule"], "WEEKLY");
        assert_eq!(value["day"], "SUN");
        assert_eq!(value["start_time"], "02:00");
    }

    #[test]
    fn test_daily_definition_has_no_day() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path(), Platform::Windows);
        let job = JobSpec::new(&test_config(&ctx), BackupKind::Daily, Path::new("/opt/zb.exe"));
        let def = definition(&job);
        assert_eq!(def.schedule, "DAILY");
        assert!(def.day.is_none());
        assert!(def.command.starts_with("\"/opt/zb.exe\" \"--config\""));
        assert!(def.command.ends_with("\"backup\" \"daily\""));
    }

    #[test]
    fn test_parse_task_state() {
        let output = "HostName:      DESKTOP\nTaskName:      \\ZenBackupDaily\nStatus:        Ready\nScheduled Task State: Disabled\n";
        assert_eq!(parse_task_state(output).as_deref(), Some("Disabled"));

        let output = "TaskName: \\ZenBackupDaily\nStatus: Running\n";
        assert_eq!(parse_task_state(output).as_deref(), Some("Running"));

        assert_eq!(parse_task_state("nothing useful"), None);
    }

    #[test]
    fn test_host_verbs() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path(), Platform::Windows);
        let plane = SimulatedControlPlane::new();
        let backend = TaskScheduler::with_control(&ctx.app_data_dir(), Box::new(plane.clone()));

        backend
            .install(&test_config(&ctx), Path::new("/opt/zen-backup.exe"))
            .unwrap();
        backend.stop().unwrap();
        backend.start().unwrap();

        let calls = plane.invocations();
        assert!(calls
            .iter()
            .any(|c| c.starts_with("schtasks /Create /F /TN ZenBackupWeekly /SC WEEKLY /D SUN /ST 02:00 /TR ")));
        assert!(calls
            .iter()
            .any(|c| c.starts_with("schtasks /Create /F /TN ZenBackupDaily /SC DAILY /ST 12:30 /TR ")));
        assert!(calls.contains(&"schtasks /Change /TN ZenBackupDaily /DISABLE".to_string()));
        assert!(calls.contains(&"schtasks /Change /TN ZenBackupWeekly /ENABLE".to_string()));
    }
}
