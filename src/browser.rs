//! Browser running check
//!
//! Backups of a running browser are allowed (with a warning); restores are
//! refused. `ZEN_BACKUP_BROWSER_RUNNING` (`1` or `0`) overrides the probe.

use std::time::Duration;

use tracing::debug;

use crate::context::{Platform, RuntimeContext};
use crate::process::run_bounded;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Process name of the browser
const PROCESS_NAME: &str = "zen";

/// Whether the browser is reported running
pub fn is_running(ctx: &RuntimeContext) -> bool {
    match ctx.var("ZEN_BACKUP_BROWSER_RUNNING") {
        Some("1") => return true,
        Some("0") => return false,
        _ => {}
    }

    // Only the real host's process table can be probed
    if Platform::host() != Some(ctx.platform) {
        return false;
    }

    let (program, args): (&str, Vec<String>) = match ctx.platform {
        Platform::MacOs | Platform::Linux => ("pgrep", vec!["-x".into(), PROCESS_NAME.into()]),
        Platform::Windows => (
            "tasklist",
            vec![
                "/FI".into(),
                format!("IMAGENAME eq {}.exe", PROCESS_NAME),
                "/NH".into(),
            ],
        ),
    };

    match run_bounded(program, &args, PROBE_TIMEOUT) {
        Ok(outcome) => match ctx.platform {
            Platform::Windows => {
                outcome.success
                    && outcome
                        .stdout
                        .to_ascii_lowercase()
                        .contains(&format!("{}.exe", PROCESS_NAME))
            }
            _ => outcome.success,
        },
        Err(e) => {
            debug!(error = %e, "browser probe failed, assuming not running");
            false
        }
    }
}
