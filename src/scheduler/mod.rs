//! Scheduler abstraction
//!
//! Each platform backend (launchd, systemd user timers, Windows Task
//! Scheduler) supplies a handful of primitives: where job definitions live,
//! how to render them, and the control verbs to register, deregister, enable
//! and disable a job. The lifecycle (`install`, `uninstall`, `start`, `stop`,
//! `query`) is shared and written once on top of those primitives.
//!
//! Whether the verbs reach the real facility or are only recorded is decided
//! by the backend's `ControlPlane`, independently of the platform.

pub mod control;
pub mod launchd;
pub mod markers;
pub mod systemd;
pub mod task_scheduler;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::paths::find_unexpanded_token;
use crate::config::BackupConfig;
use crate::context::{Platform, RuntimeContext};
use crate::error::{BackupError, BackupResult};
use crate::models::{BackupKind, JobSchedule, JobState, JobStatus, SchedulerStatus};

pub use control::{
    select_control_plane, ControlMode, ControlPlane, HostControlPlane, SimulatedControlPlane,
};
pub use launchd::Launchd;
pub use markers::Markers;
pub use systemd::Systemd;
pub use task_scheduler::TaskScheduler;

/// Live facts reported by the host facility for one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostJobFacts {
    pub enabled: bool,
    pub loaded: bool,
}

/// Everything state resolution looks at for one job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobFacts {
    pub definition_exists: bool,
    pub disabled_marker: bool,
    pub loaded_marker: bool,
    /// Present only when the host facility answered
    pub host: Option<HostJobFacts>,
}

/// Derive a job's state from its facts.
///
/// No definition means not installed, whatever else is true. Live host facts
/// win over markers when present.
pub fn resolve_state(facts: &JobFacts) -> JobState {
    if !facts.definition_exists {
        return JobState::NotInstalled;
    }
    match facts.host {
        Some(host) if host.enabled && host.loaded => JobState::Active,
        Some(_) => JobState::Paused,
        None if facts.disabled_marker || !facts.loaded_marker => JobState::Paused,
        None => JobState::Active,
    }
}

/// Everything needed to render one job definition
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub kind: BackupKind,
    pub schedule: JobSchedule,
    /// Absolute path of the binary the job runs
    pub executable: PathBuf,
    /// Where the job's output goes
    pub log_path: PathBuf,
    /// Settings file passed to the job with `--config`
    pub config_path: PathBuf,
}

impl JobSpec {
    pub fn new(config: &BackupConfig, kind: BackupKind, executable: &Path) -> Self {
        Self {
            kind,
            schedule: config.schedule(kind),
            executable: executable.to_path_buf(),
            log_path: config.log_path(),
            config_path: config.config_path.clone(),
        }
    }

    /// Command-line arguments after the executable
    pub fn arguments(&self) -> Vec<String> {
        vec![
            "--config".to_string(),
            self.config_path.display().to_string(),
            "backup".to_string(),
            self.kind.to_string(),
        ]
    }
}

/// One platform's job facility
pub trait SchedulerBackend {
    /// How control verbs are executed
    fn control(&self) -> &dyn ControlPlane;

    /// Directory holding the job definitions and marker files
    fn definition_dir(&self) -> &Path;

    /// Platform label of the job for `kind`
    fn job_name(&self, kind: BackupKind) -> String;

    /// Definition files for `kind`; the first decides whether it is installed
    fn definition_files(&self, kind: BackupKind) -> Vec<PathBuf>;

    /// Definition files with their contents
    fn render_definitions(&self, job: &JobSpec) -> BackupResult<Vec<(PathBuf, String)>>;

    /// Hand a freshly written definition to the facility
    fn register(&self, job: &JobSpec) -> BackupResult<()>;

    /// Remove a job from the facility
    fn deregister(&self, kind: BackupKind) -> BackupResult<()>;

    fn enable(&self, kind: BackupKind) -> BackupResult<()>;

    fn disable(&self, kind: BackupKind) -> BackupResult<()>;

    /// Bring a paused job back; enabling is enough unless the facility
    /// also needs the job reloaded
    fn resume(&self, kind: BackupKind) -> BackupResult<()> {
        self.enable(kind)
    }

    /// Make the facility re-read definition files
    fn reload(&self) -> BackupResult<()> {
        Ok(())
    }

    /// Ask the facility about a job
    fn host_facts(&self, kind: BackupKind) -> BackupResult<HostJobFacts>;

    fn markers(&self) -> Markers {
        Markers::new(self.definition_dir())
    }

    fn is_installed(&self, kind: BackupKind) -> bool {
        self.definition_files(kind)
            .first()
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Write both job definitions, register them and mark them active
    fn install(&self, config: &BackupConfig, executable: &Path) -> BackupResult<SchedulerStatus> {
        let jobs: Vec<JobSpec> = BackupKind::ALL
            .iter()
            .map(|kind| JobSpec::new(config, *kind, executable))
            .collect();

        // Render and check everything before touching the disk
        let mut definitions = Vec::new();
        for job in &jobs {
            for (path, contents) in self.render_definitions(job)? {
                if let Some(token) = find_unexpanded_token(&contents) {
                    return Err(BackupError::Scheduler(format!(
                        "job definition {} contains unexpanded token {}",
                        path.display(),
                        token
                    )));
                }
                definitions.push((path, contents));
            }
        }

        let dir = self.definition_dir();
        fs::create_dir_all(dir)
            .map_err(|e| BackupError::Io(format!("Failed to create {}: {}", dir.display(), e)))?;

        // A previous registration may or may not exist
        for job in &jobs {
            if let Err(e) = self.deregister(job.kind) {
                debug!(job = %self.job_name(job.kind), error = %e, "nothing to deregister");
            }
        }

        for (path, contents) in &definitions {
            fs::write(path, contents)
                .map_err(|e| BackupError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
        }

        self.reload()?;
        for job in &jobs {
            self.register(job)?;
        }

        let markers = self.markers();
        markers.set_loaded()?;
        for job in &jobs {
            markers.clear_disabled(&self.job_name(job.kind));
        }

        info!(dir = %dir.display(), mode = ?self.control().mode(), "scheduled jobs installed");
        self.query()
    }

    /// Deregister and delete everything. Facility errors are ignored.
    fn uninstall(&self) -> BackupResult<SchedulerStatus> {
        let markers = self.markers();
        for kind in BackupKind::ALL {
            if self.is_installed(kind) {
                if let Err(e) = self.deregister(kind) {
                    warn!(job = %self.job_name(kind), error = %e, "deregister failed");
                }
            }
            for path in self.definition_files(kind) {
                markers::remove_if_exists(&path);
            }
            markers.clear_disabled(&self.job_name(kind));
        }
        markers.clear_loaded();

        if let Err(e) = self.reload() {
            warn!(error = %e, "reload after uninstall failed");
        }
        self.query()
    }

    /// Resume both jobs; does nothing unless both are installed
    fn start(&self) -> BackupResult<SchedulerStatus> {
        if !BackupKind::ALL.iter().all(|kind| self.is_installed(*kind)) {
            return self.query();
        }
        let markers = self.markers();
        for kind in BackupKind::ALL {
            self.resume(kind)?;
            markers.clear_disabled(&self.job_name(kind));
        }
        markers.set_loaded()?;
        self.query()
    }

    /// Pause both jobs; does nothing unless both are installed
    fn stop(&self) -> BackupResult<SchedulerStatus> {
        if !BackupKind::ALL.iter().all(|kind| self.is_installed(*kind)) {
            return self.query();
        }
        let markers = self.markers();
        for kind in BackupKind::ALL {
            self.disable(kind)?;
            markers.set_disabled(&self.job_name(kind))?;
        }
        markers.set_loaded()?;
        self.query()
    }

    fn query(&self) -> BackupResult<SchedulerStatus> {
        let markers = self.markers();
        let jobs = BackupKind::ALL
            .iter()
            .map(|kind| {
                let label = self.job_name(*kind);
                let definition_exists = self.is_installed(*kind);
                let host = if definition_exists && self.control().is_host() {
                    match self.host_facts(*kind) {
                        Ok(facts) => Some(facts),
                        Err(e) => {
                            debug!(job = %label, error = %e, "host query failed, using markers");
                            None
                        }
                    }
                } else {
                    None
                };
                let facts = JobFacts {
                    definition_exists,
                    disabled_marker: markers.is_disabled(&label),
                    loaded_marker: markers.is_loaded(),
                    host,
                };
                JobStatus {
                    kind: *kind,
                    label,
                    state: resolve_state(&facts),
                }
            })
            .collect();
        Ok(SchedulerStatus { jobs })
    }
}

/// The scheduler backend for a platform
pub enum PlatformScheduler {
    Launchd(Launchd),
    Systemd(Systemd),
    TaskScheduler(TaskScheduler),
}

impl PlatformScheduler {
    /// Backend for the context's platform, with the control plane chosen for it
    pub fn for_context(ctx: &RuntimeContext) -> Self {
        match ctx.platform {
            Platform::MacOs => PlatformScheduler::Launchd(Launchd::new(ctx)),
            Platform::Linux => PlatformScheduler::Systemd(Systemd::new(ctx)),
            Platform::Windows => PlatformScheduler::TaskScheduler(TaskScheduler::new(ctx)),
        }
    }

    /// Backend for the context's platform using `control`
    pub fn with_control(ctx: &RuntimeContext, control: Box<dyn ControlPlane>) -> Self {
        match ctx.platform {
            Platform::MacOs => {
                PlatformScheduler::Launchd(Launchd::with_control(&ctx.home_dir(), control))
            }
            Platform::Linux => {
                PlatformScheduler::Systemd(Systemd::with_control(&ctx.home_dir(), control))
            }
            Platform::Windows => PlatformScheduler::TaskScheduler(TaskScheduler::with_control(
                &ctx.app_data_dir(),
                control,
            )),
        }
    }

    pub fn backend(&self) -> &dyn SchedulerBackend {
        match self {
            PlatformScheduler::Launchd(b) => b,
            PlatformScheduler::Systemd(b) => b,
            PlatformScheduler::TaskScheduler(b) => b,
        }
    }

    pub fn install(&self, config: &BackupConfig, executable: &Path) -> BackupResult<SchedulerStatus> {
        self.backend().install(config, executable)
    }

    pub fn uninstall(&self) -> BackupResult<SchedulerStatus> {
        self.backend().uninstall()
    }

    pub fn start(&self) -> BackupResult<SchedulerStatus> {
        self.backend().start()
    }

    pub fn stop(&self) -> BackupResult<SchedulerStatus> {
        self.backend().stop()
    }

    pub fn query(&self) -> BackupResult<SchedulerStatus> {
        self.backend().query()
    }
}
