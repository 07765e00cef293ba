//! Backup log entry data structures
//!
//! Each entry is one line: `[<RFC 3339 timestamp>] <LEVEL>: <message>`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::BackupError;

/// Severity of a backup log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// A backup completed
    Success,
    /// Something non-fatal happened (fallback copy, failed prune)
    Warning,
    /// An operation failed
    Error,
    /// A restore completed
    Restore,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Success => write!(f, "SUCCESS"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Restore => write!(f, "RESTORE"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(LogLevel::Success),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "RESTORE" => Ok(LogLevel::Restore),
            other => Err(BackupError::Config(format!("unknown log level: {}", other))),
        }
    }
}

/// A single backup log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// When the line was written (UTC)
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
        }
    }

    /// Parse a line written by `Display`; `None` for anything else
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim_end().strip_prefix('[')?;
        let (timestamp, rest) = rest.split_once("] ")?;
        let (level, message) = rest.split_once(": ")?;

        Some(Self {
            timestamp: DateTime::parse_from_rfc3339(timestamp)
                .ok()?
                .with_timezone(&Utc),
            level: level.parse().ok()?,
            message: message.to_string(),
        })
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.level,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_line() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 0).unwrap();
        let entry = LogEntry::new(ts, LogLevel::Success, "created daily backup x");
        assert_eq!(
            entry.to_string(),
            "[2026-01-15T12:30:00.000Z] SUCCESS: created daily backup x"
        );
    }

    #[test]
    fn test_parse_line() {
        let entry =
            LogEntry::parse("[2026-01-15T12:30:00.000Z] WARNING: fallback copy used: a: b").unwrap();
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.message, "fallback copy used: a: b");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(LogEntry::parse("").is_none());
        assert!(LogEntry::parse("hello").is_none());
        assert!(LogEntry::parse("[yesterday] SUCCESS: x").is_none());
        assert!(LogEntry::parse("[2026-01-15T12:30:00Z] INFO: x").is_none());
    }
}
