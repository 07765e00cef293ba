//! Scheduler control planes
//!
//! A control plane executes the platform's control commands (`launchctl`,
//! `systemctl --user`, `schtasks`). The host plane runs them for real; the
//! simulated plane only records them, leaving marker files as the sole
//! state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};

use crate::context::{Platform, RuntimeContext};
use crate::error::{BackupError, BackupResult};
use crate::process::{run_bounded, CommandOutcome};

/// Deadline for any single control command
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for the availability probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Which execution backend is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Talks to the real platform facility
    Host,
    /// Filesystem markers only
    Simulated,
}

/// Executes scheduler control commands
pub trait ControlPlane {
    fn mode(&self) -> ControlMode;

    /// Run a control command. A non-zero exit is reported in the outcome.
    fn run(&self, program: &str, args: &[String]) -> BackupResult<CommandOutcome>;

    /// Run a control command and treat a non-zero exit as an error
    fn run_checked(&self, program: &str, args: &[String]) -> BackupResult<CommandOutcome> {
        let outcome = self.run(program, args)?;
        if outcome.success {
            Ok(outcome)
        } else {
            Err(BackupError::Scheduler(format!(
                "{} {} failed: {}",
                program,
                args.join(" "),
                outcome.message()
            )))
        }
    }

    fn is_host(&self) -> bool {
        self.mode() == ControlMode::Host
    }
}

/// Runs commands on the host with a bounded wait
pub struct HostControlPlane {
    timeout: Duration,
}

impl HostControlPlane {
    pub fn new() -> Self {
        Self {
            timeout: COMMAND_TIMEOUT,
        }
    }
}

impl Default for HostControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPlane for HostControlPlane {
    fn mode(&self) -> ControlMode {
        ControlMode::Host
    }

    fn run(&self, program: &str, args: &[String]) -> BackupResult<CommandOutcome> {
        run_bounded(program, args, self.timeout)
            .map_err(|e| BackupError::Scheduler(e.to_string()))
    }
}

/// Records commands without executing them; every command succeeds.
/// Clones share one record.
#[derive(Debug, Clone, Default)]
pub struct SimulatedControlPlane {
    invocations: Arc<Mutex<Vec<String>>>,
}

impl SimulatedControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands issued so far, one `program arg arg ...` string each
    pub fn invocations(&self) -> Vec<String> {
        self.invocations
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }
}

impl ControlPlane for SimulatedControlPlane {
    fn mode(&self) -> ControlMode {
        ControlMode::Simulated
    }

    fn run(&self, program: &str, args: &[String]) -> BackupResult<CommandOutcome> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(command = %line, "simulated scheduler command");
        if let Ok(mut list) = self.invocations.lock() {
            list.push(line);
        }
        Ok(CommandOutcome::ok())
    }
}

/// Why the simulated plane was chosen, if it was
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationReason {
    Forced,
    ForeignPlatform,
    BinaryMissing(String),
    ForeignHome,
    ProbeFailed(String),
}

/// Pick the control plane for `ctx`.
///
/// The host plane is used only when nothing forces simulation
/// (`ZEN_BACKUP_SCHEDULER=simulated`), the context targets the running OS,
/// `binary` is on the context's `PATH`, the context home is the real user's
/// home, and `binary probe_args` succeeds within `PROBE_TIMEOUT`.
pub fn select_control_plane(
    ctx: &RuntimeContext,
    binary: &str,
    probe_args: &[String],
) -> Box<dyn ControlPlane> {
    match simulation_reason(ctx, binary, probe_args) {
        None => {
            debug!(binary, "using host scheduler");
            Box::new(HostControlPlane::new())
        }
        Some(reason) => {
            info!(?reason, "using simulated scheduler");
            Box::new(SimulatedControlPlane::new())
        }
    }
}

fn simulation_reason(
    ctx: &RuntimeContext,
    binary: &str,
    probe_args: &[String],
) -> Option<SimulationReason> {
    if ctx.var("ZEN_BACKUP_SCHEDULER") == Some("simulated") {
        return Some(SimulationReason::Forced);
    }
    if Platform::host() != Some(ctx.platform) {
        return Some(SimulationReason::ForeignPlatform);
    }
    if which::which_in(binary, ctx.var("PATH"), &ctx.cwd).is_err() {
        return Some(SimulationReason::BinaryMissing(binary.to_string()));
    }
    match real_home() {
        Some(home) if same_path(&home, &ctx.home_dir()) => {}
        _ => return Some(SimulationReason::ForeignHome),
    }

    match run_bounded(binary, probe_args, PROBE_TIMEOUT) {
        Ok(outcome) if outcome.success => None,
        Ok(outcome) => Some(SimulationReason::ProbeFailed(outcome.message().to_string())),
        Err(e) => Some(SimulationReason::ProbeFailed(e.to_string())),
    }
}

/// Home directory of the user the process runs as, ignoring `HOME`
#[cfg(unix)]
fn real_home() -> Option<PathBuf> {
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|user| user.dir)
}

#[cfg(not(unix))]
fn real_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

fn same_path(a: &Path, b: &Path) -> bool {
    let canonical = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
    canonical(a) == canonical(b)
}

/// Numeric user id, for launchd's `gui/<uid>` domain
#[cfg(unix)]
pub fn current_uid() -> u32 {
    nix::unistd::getuid().as_raw()
}

#[cfg(not(unix))]
pub fn current_uid() -> u32 {
    0
}
