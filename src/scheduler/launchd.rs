//! macOS launch agents
//!
//! One property list per job in `~/Library/LaunchAgents`, registered in the
//! user's `gui/<uid>` domain with `launchctl bootstrap`.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::control::{current_uid, select_control_plane, ControlPlane};
use super::{HostJobFacts, JobSpec, SchedulerBackend};
use crate::context::RuntimeContext;
use crate::error::BackupResult;
use crate::models::BackupKind;

pub const DAILY_LABEL: &str = "com.prometheas.zen-backup.daily";
pub const WEEKLY_LABEL: &str = "com.prometheas.zen-backup.weekly";

const LAUNCHCTL: &str = "launchctl";

pub struct Launchd {
    agents_dir: PathBuf,
    uid: u32,
    control: Box<dyn ControlPlane>,
}

impl Launchd {
    pub fn new(ctx: &RuntimeContext) -> Self {
        let uid = current_uid();
        let control = select_control_plane(ctx, LAUNCHCTL, &[
            "print".to_string(),
            format!("gui/{}", uid),
        ]);
        Self {
            agents_dir: agents_dir(&ctx.home_dir()),
            uid,
            control,
        }
    }

    pub fn with_control(home: &Path, control: Box<dyn ControlPlane>) -> Self {
        Self {
            agents_dir: agents_dir(home),
            uid: current_uid(),
            control,
        }
    }

    fn domain(&self) -> String {
        format!("gui/{}", self.uid)
    }

    fn service_target(&self, kind: BackupKind) -> String {
        format!("{}/{}", self.domain(), label(kind))
    }

    fn plist_path(&self, kind: BackupKind) -> PathBuf {
        self.agents_dir.join(format!("{}.plist", label(kind)))
    }

    fn bootstrap(&self, kind: BackupKind) -> BackupResult<()> {
        let plist = self.plist_path(kind).display().to_string();
        self.control
            .run_checked(LAUNCHCTL, &["bootstrap".to_string(), self.domain(), plist])?;
        Ok(())
    }

    /// `launchctl print` only succeeds for a loaded service
    fn is_loaded(&self, kind: BackupKind) -> BackupResult<bool> {
        let outcome = self
            .control
            .run(LAUNCHCTL, &["print".to_string(), self.service_target(kind)])?;
        Ok(outcome.success)
    }
}

fn agents_dir(home: &Path) -> PathBuf {
    home.join("Library").join("LaunchAgents")
}

pub fn label(kind: BackupKind) -> &'static str {
    match kind {
        BackupKind::Daily => DAILY_LABEL,
        BackupKind::Weekly => WEEKLY_LABEL,
    }
}

impl SchedulerBackend for Launchd {
    fn control(&self) -> &dyn ControlPlane {
        self.control.as_ref()
    }

    fn definition_dir(&self) -> &Path {
        &self.agents_dir
    }

    fn job_name(&self, kind: BackupKind) -> String {
        label(kind).to_string()
    }

    fn definition_files(&self, kind: BackupKind) -> Vec<PathBuf> {
        vec![self.plist_path(kind)]
    }

    fn render_definitions(&self, job: &JobSpec) -> BackupResult<Vec<(PathBuf, String)>> {
        Ok(vec![(self.plist_path(job.kind), render_plist(job))])
    }

    fn register(&self, job: &JobSpec) -> BackupResult<()> {
        self.enable(job.kind)?;
        self.bootstrap(job.kind)
    }

    fn deregister(&self, kind: BackupKind) -> BackupResult<()> {
        self.control
            .run_checked(LAUNCHCTL, &["bootout".to_string(), self.service_target(kind)])?;
        Ok(())
    }

    fn enable(&self, kind: BackupKind) -> BackupResult<()> {
        self.control
            .run_checked(LAUNCHCTL, &["enable".to_string(), self.service_target(kind)])?;
        Ok(())
    }

    fn disable(&self, kind: BackupKind) -> BackupResult<()> {
        self.control
            .run_checked(LAUNCHCTL, &["disable".to_string(), self.service_target(kind)])?;
        Ok(())
    }

    /// launchd skips disabled agents at login, so a job paused across a
    /// login is no longer loaded and has to be bootstrapped again
    fn resume(&self, kind: BackupKind) -> BackupResult<()> {
        self.enable(kind)?;
        if !self.is_loaded(kind)? {
            debug!(job = label(kind), "job not loaded, bootstrapping");
            self.bootstrap(kind)?;
        }
        Ok(())
    }

    fn host_facts(&self, kind: BackupKind) -> BackupResult<HostJobFacts> {
        let disabled = self
            .control
            .run_checked(LAUNCHCTL, &["print-disabled".to_string(), self.domain()])?;
        Ok(HostJobFacts {
            enabled: !listed_as_disabled(&disabled.stdout, label(kind)),
            loaded: self.is_loaded(kind)?,
        })
    }
}

/// Whether `print-disabled` output marks `label` as disabled.
///
/// Lines look like `"com.example.job" => disabled` (or `=> true` on older
/// releases).
fn listed_as_disabled(output: &str, label: &str) -> bool {
    let quoted = format!("\"{}\"", label);
    output.lines().any(|line| {
        let line = line.trim();
        match line.split_once("=>") {
            Some((name, value)) => {
                name.trim() == quoted && matches!(value.trim(), "disabled" | "true")
            }
            None => false,
        }
    })
}

fn render_plist(job: &JobSpec) -> String {
    let mut program = vec![escape(&job.executable.display().to_string())];
    program.extend(job.arguments().iter().map(|arg| escape(arg)));
    let program = program
        .iter()
        .map(|arg| format!("      <string>{}</string>\n", arg))
        .collect::<String>();

    let weekday = job
        .schedule
        .weekday
        .map(|day| {
            format!(
                "      <key>Weekday</key>\n      <integer>{}</integer>\n",
                day.num_days_from_sunday()
            )
        })
        .unwrap_or_default();

    let log = escape(&job.log_path.display().to_string());

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
  <dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
{program}    </array>
    <key>StartCalendarInterval</key>
    <dict>
{weekday}      <key>Hour</key>
      <integer>{hour}</integer>
      <key>Minute</key>
      <integer>{minute}</integer>
    </dict>
    <key>StandardOutPath</key>
    <string>{log}</string>
    <key>StandardErrorPath</key>
    <string>{log}</string>
  </dict>
</plist>
"#,
        label = label(job.kind),
        program = program,
        weekday = weekday,
        hour = job.schedule.time.hour,
        minute = job.schedule.time.minute,
        log = log,
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
