//! Backup log for zen-backup
//!
//! Records backups, restores, warnings and failures in an append-only,
//! human-readable log kept next to the archives in `<backup root>/backup.log`.
//!
//! # Architecture
//!
//! - `LogEntry`: a single line with timestamp, level and message.
//! - `BackupLog`: appends entries to the log file and reads them back for
//!   `status`.
//!
//! # Example
//!
//! ```rust,ignore
//! use zen_backup::audit::{BackupLog, LogLevel};
//!
//! let log = BackupLog::new(&backup_root);
//! log.append(ctx.now, LogLevel::Success, "created daily backup /b/daily/x.tar.gz")?;
//! ```

mod entry;
mod logger;

pub use entry::{LogEntry, LogLevel};
pub use logger::{BackupLog, LOG_FILE_NAME};
