//! systemd user timers
//!
//! Each job is a oneshot service plus a timer in `~/.config/systemd/user`.
//! The timer is the job: it is what gets enabled, disabled and reported.

use std::path::{Path, PathBuf};

use super::control::{select_control_plane, ControlPlane};
use super::{HostJobFacts, JobSpec, SchedulerBackend};
use crate::context::RuntimeContext;
use crate::error::BackupResult;
use crate::models::schedule::weekday_abbrev;
use crate::models::BackupKind;

const SYSTEMCTL: &str = "systemctl";

pub struct Systemd {
    unit_dir: PathBuf,
    control: Box<dyn ControlPlane>,
}

impl Systemd {
    pub fn new(ctx: &RuntimeContext) -> Self {
        let control = select_control_plane(ctx, SYSTEMCTL, &[
            "--user".to_string(),
            "show-environment".to_string(),
        ]);
        Self {
            unit_dir: unit_dir(&ctx.home_dir()),
            control,
        }
    }

    pub fn with_control(home: &Path, control: Box<dyn ControlPlane>) -> Self {
        Self {
            unit_dir: unit_dir(home),
            control,
        }
    }

    fn systemctl(&self, args: &[&str]) -> BackupResult<()> {
        self.control.run_checked(SYSTEMCTL, &user_args(args))?;
        Ok(())
    }

    fn service_path(&self, kind: BackupKind) -> PathBuf {
        self.unit_dir.join(service_name(kind))
    }

    fn timer_path(&self, kind: BackupKind) -> PathBuf {
        self.unit_dir.join(timer_name(kind))
    }
}

fn unit_dir(home: &Path) -> PathBuf {
    home.join(".config").join("systemd").join("user")
}

fn user_args(args: &[&str]) -> Vec<String> {
    std::iter::once("--user")
        .chain(args.iter().copied())
        .map(str::to_string)
        .collect()
}

pub fn service_name(kind: BackupKind) -> String {
    format!("zen-backup-{}.service", kind)
}

pub fn timer_name(kind: BackupKind) -> String {
    format!("zen-backup-{}.timer", kind)
}

impl SchedulerBackend for Systemd {
    fn control(&self) -> &dyn ControlPlane {
        self.control.as_ref()
    }

    fn definition_dir(&self) -> &Path {
        &self.unit_dir
    }

    fn job_name(&self, kind: BackupKind) -> String {
        timer_name(kind)
    }

    fn definition_files(&self, kind: BackupKind) -> Vec<PathBuf> {
        vec![self.timer_path(kind), self.service_path(kind)]
    }

    fn render_definitions(&self, job: &JobSpec) -> BackupResult<Vec<(PathBuf, String)>> {
        Ok(vec![
            (self.service_path(job.kind), render_service(job)),
            (self.timer_path(job.kind), render_timer(job)),
        ])
    }

    fn register(&self, job: &JobSpec) -> BackupResult<()> {
        self.enable(job.kind)
    }

    fn deregister(&self, kind: BackupKind) -> BackupResult<()> {
        self.disable(kind)
    }

    fn enable(&self, kind: BackupKind) -> BackupResult<()> {
        let timer = timer_name(kind);
        self.systemctl(&["enable", "--now", timer.as_str()])
    }

    fn disable(&self, kind: BackupKind) -> BackupResult<()> {
        let timer = timer_name(kind);
        self.systemctl(&["disable", "--now", timer.as_str()])
    }

    fn reload(&self) -> BackupResult<()> {
        self.systemctl(&["daemon-reload"])
    }

    fn host_facts(&self, kind: BackupKind) -> BackupResult<HostJobFacts> {
        let timer = timer_name(kind);
        // Both verbs exit non-zero for "disabled"/"inactive", so only stdout matters
        let enabled = self
            .control
            .run(SYSTEMCTL, &user_args(&["is-enabled", timer.as_str()]))?;
        let active = self
            .control
            .run(SYSTEMCTL, &user_args(&["is-active", timer.as_str()]))?;

        Ok(HostJobFacts {
            enabled: enabled.stdout.trim() == "enabled",
            loaded: active.stdout.trim() == "active",
        })
    }
}

fn render_service(job: &JobSpec) -> String {
    let command = std::iter::once(job.executable.display().to_string())
        .chain(job.arguments())
        .map(|arg| quote(&arg))
        .collect::<Vec<_>>()
        .join(" ");
    let log = job.log_path.display();

    format!(
        "[Unit]\n\
         Description=Zen profile backup ({kind})\n\
         \n\
         [Service]\n\
         Type=oneshot\n\
         ExecStart={command}\n\
         StandardOutput=append:{log}\n\
         StandardError=append:{log}\n",
        kind = job.kind,
        command = command,
        log = log,
    )
}

fn render_timer(job: &JobSpec) -> String {
    format!(
        "[Unit]\n\
         Description=Zen profile backup ({kind}) timer\n\
         \n\
         [Timer]\n\
         OnCalendar={calendar}\n\
         Persistent=true\n\
         Unit={service}\n\
         \n\
         [Install]\n\
         WantedBy=timers.target\n",
        kind = job.kind,
        calendar = on_calendar(job),
        service = service_name(job.kind),
    )
}

/// `OnCalendar=` expression for the job's schedule
fn on_calendar(job: &JobSpec) -> String {
    let time = job.schedule.time;
    let clock = format!("*-*-* {:02}:{:02}:00", time.hour, time.minute);
    match job.schedule.weekday {
        Some(day) => format!("{} {}", weekday_abbrev(day), clock),
        None => clock,
    }
}

/// Quote an `ExecStart=` argument. systemd treats `%` as a specifier
/// prefix, so it is doubled.
fn quote(arg: &str) -> String {
    let escaped = arg.replace('\\', "\\\\").replace('"', "\\\"").replace('%', "%%");
    format!("\"{}\"", escaped)
}
