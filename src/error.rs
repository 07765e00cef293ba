//! Custom error types for zen-backup
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Variants follow the failure classes the
//! agent distinguishes: precondition failures (nothing was touched), integrity
//! failures (no partial artifact is left behind), partial failures (the local
//! result stands) and platform failures from the scheduling facility.

use thiserror::Error;

/// The main error type for zen-backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// TOML serialization/deserialization errors
    #[error("TOML error: {0}")]
    Toml(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A condition that must hold before any mutation is attempted
    #[error("{0}")]
    Precondition(String),

    /// Archive could not be read, or contains unsafe entries
    #[error("invalid or corrupted archive: {0}")]
    InvalidArchive(String),

    /// SQLite integrity check failed
    #[error("sqlite integrity check failed for {path}: {detail}")]
    Integrity { path: String, detail: String },

    /// SQLite errors outside of the integrity check
    #[error("Database error: {0}")]
    Database(String),

    /// Scheduling facility errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Secondary (cloud) copy failed after a successful local backup
    #[error("cloud sync failed: {0}")]
    CloudSync(String),

    /// The running platform has no scheduler backend
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

impl BackupError {
    /// Create a "not found" error for settings files
    pub fn config_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "config file",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for archives
    pub fn archive_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "archive",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for the profile directory
    pub fn profile_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "profile path",
            identifier: identifier.into(),
        }
    }

    /// Create an integrity error for a database file
    pub fn integrity(path: &std::path::Path, detail: impl Into<String>) -> Self {
        Self::Integrity {
            path: path.display().to_string(),
            detail: detail.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a precondition error
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_) | Self::NotFound { .. })
    }

    /// Check if this is an integrity error (archive or database)
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. } | Self::InvalidArchive(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<toml::de::Error> for BackupError {
    fn from(err: toml::de::Error) -> Self {
        Self::Toml(err.to_string())
    }
}

impl From<rusqlite::Error> for BackupError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for zen-backup operations
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackupError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = BackupError::archive_not_found("nope.tar.gz");
        assert_eq!(err.to_string(), "archive not found: nope.tar.gz");
        assert!(err.is_not_found());
        assert!(err.is_precondition());
    }

    #[test]
    fn test_integrity_error() {
        let err = BackupError::integrity(std::path::Path::new("places.sqlite"), "malformed");
        assert_eq!(
            err.to_string(),
            "sqlite integrity check failed for places.sqlite: malformed"
        );
        assert!(err.is_integrity());
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_cloud_sync_error() {
        let err = BackupError::CloudSync("disk full".into());
        assert_eq!(err.to_string(), "cloud sync failed: disk full");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let backup_err: BackupError = io_err.into();
        assert!(matches!(backup_err, BackupError::Io(_)));
    }
}
