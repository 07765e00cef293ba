//! Diagnostic logging using tracing.
//!
//! Diagnostics go to stderr so command output on stdout stays parseable.
//! The backup log in `audit` is a separate, user-facing record.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging. `RUST_LOG` wins; otherwise `verbose` selects `debug`
/// over the default `warn`.
pub fn init(verbose: bool) {
    let level = if verbose { "zen_backup=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (e.g. from tests) leaves the first subscriber in place.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
