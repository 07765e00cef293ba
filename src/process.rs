//! Bounded subprocess execution
//!
//! External helpers (scheduler control binaries, notification helpers,
//! process probes) can hang; every call here is force-killed after its
//! deadline.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{BackupError, BackupResult};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exit status and captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    /// Successful outcome with no output
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            ..Self::default()
        }
    }

    /// stderr if there is any, otherwise stdout
    pub fn message(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Run `program` with `args`, killing it if it runs past `timeout`.
///
/// A non-zero exit is reported in the outcome; spawn failures and timeouts
/// are errors.
pub fn run_bounded(program: &str, args: &[String], timeout: Duration) -> BackupResult<CommandOutcome> {
    debug!(program, ?args, "running command");
    let start = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BackupError::Io(format!("failed to spawn {}: {}", program, e)))?;

    // Drain the pipes on their own threads so a chatty child can't block on a full pipe
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BackupError::Io(format!(
                        "{} timed out after {}s",
                        program,
                        timeout.as_secs_f32()
                    )));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(BackupError::Io(format!(
                    "failed to check {} status: {}",
                    program, e
                )))
            }
        }
    };

    let collect = |handle: Option<thread::JoinHandle<String>>| {
        handle.and_then(|h| h.join().ok()).unwrap_or_default()
    };

    Ok(CommandOutcome {
        success: status.success(),
        code: status.code(),
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}
