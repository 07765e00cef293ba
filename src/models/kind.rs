//! Backup kinds
//!
//! Daily and weekly backups are independent cadences with their own
//! directories, retention periods and scheduled jobs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BackupError;

/// One of the two backup cadences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    Daily,
    Weekly,
}

impl BackupKind {
    /// Both kinds, in the order they are reported
    pub const ALL: [BackupKind; 2] = [BackupKind::Daily, BackupKind::Weekly];

    /// Lowercase name used in filenames and directory names
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupKind::Daily => "daily",
            BackupKind::Weekly => "weekly",
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackupKind {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(BackupKind::Daily),
            "weekly" => Ok(BackupKind::Weekly),
            _ => Err(BackupError::Precondition(
                "backup kind must be daily or weekly".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("daily".parse::<BackupKind>().unwrap(), BackupKind::Daily);
        assert_eq!("WEEKLY".parse::<BackupKind>().unwrap(), BackupKind::Weekly);
        assert!("monthly".parse::<BackupKind>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(BackupKind::Daily.to_string(), "daily");
        assert_eq!(BackupKind::Weekly.to_string(), "weekly");
    }
}
