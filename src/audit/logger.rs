//! Append-only backup log
//!
//! Provides the BackupLog struct that writes log entries to `backup.log`.
//! Each entry is written as a single line and flushed immediately.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{BackupError, BackupResult};

use super::entry::{LogEntry, LogLevel};

/// Log file name inside the backup root
pub const LOG_FILE_NAME: &str = "backup.log";

/// Handles writing entries to the backup log
pub struct BackupLog {
    /// Path to the log file
    log_path: PathBuf,
}

impl BackupLog {
    /// Create a BackupLog for the given backup root
    pub fn new(backup_root: &Path) -> Self {
        Self {
            log_path: backup_root.join(LOG_FILE_NAME),
        }
    }

    /// Append one line, creating the backup root if needed
    pub fn append(
        &self,
        timestamp: DateTime<Utc>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> BackupResult<()> {
        self.log(&LogEntry::new(timestamp, level, message))
    }

    /// Log an entry
    pub fn log(&self, entry: &LogEntry) -> BackupResult<()> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BackupError::Io(format!("Failed to create backup directory: {}", e)))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BackupError::Io(format!("Failed to open backup log: {}", e)))?;

        writeln!(file, "{}", entry)
            .map_err(|e| BackupError::Io(format!("Failed to write backup log: {}", e)))?;

        file.flush()
            .map_err(|e| BackupError::Io(format!("Failed to flush backup log: {}", e)))?;

        Ok(())
    }

    /// Read all entries, oldest first. Lines that don't parse are skipped.
    pub fn read_all(&self) -> BackupResult<Vec<LogEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| BackupError::Io(format!("Failed to open backup log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                BackupError::Io(format!("Failed to read backup log line {}: {}", line_num + 1, e))
            })?;

            if let Some(entry) = LogEntry::parse(&line) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// Read the most recent N entries from the log
    pub fn read_recent(&self, count: usize) -> BackupResult<Vec<LogEntry>> {
        let all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_log() -> (BackupLog, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let log = BackupLog::new(&temp_dir.path().join("backups"));
        (log, temp_dir)
    }

    #[test]
    fn test_log_and_read() {
        let (log, _temp) = create_test_log();

        log.append(Utc::now(), LogLevel::Success, "created daily backup a")
            .unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Success);
        assert_eq!(entries[0].message, "created daily backup a");
    }

    #[test]
    fn test_read_recent() {
        let (log, _temp) = create_test_log();

        for i in 0..5 {
            log.append(Utc::now(), LogLevel::Warning, format!("warning {}", i))
                .unwrap();
        }

        let recent = log.read_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "warning 3");
        assert_eq!(recent[1].message, "warning 4");
    }

    #[test]
    fn test_skips_foreign_lines() {
        let (log, _temp) = create_test_log();
        log.append(Utc::now(), LogLevel::Error, "boom").unwrap();

        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        writeln!(file, "not a log line").unwrap();

        assert_eq!(log.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_log() {
        let (log, _temp) = create_test_log();
        assert!(log.read_all().unwrap().is_empty());
        assert!(log.read_recent(10).unwrap().is_empty());
    }
}
