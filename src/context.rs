//! Runtime context for a single invocation
//!
//! Every service receives the current time, the target platform and the
//! environment through a `RuntimeContext` instead of reading process state
//! directly. Tests build contexts by hand; `main` builds one from the process.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::BackupError;

/// Desktop platforms with a scheduler backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
}

impl Platform {
    /// Platform of the running binary, if supported
    pub fn host() -> Option<Self> {
        match std::env::consts::OS {
            "macos" => Some(Platform::MacOs),
            "linux" => Some(Platform::Linux),
            "windows" => Some(Platform::Windows),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => write!(f, "darwin"),
            Platform::Linux => write!(f, "linux"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

impl FromStr for Platform {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" => Ok(Platform::MacOs),
            "linux" => Ok(Platform::Linux),
            "windows" => Ok(Platform::Windows),
            other => Err(BackupError::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// Explicit per-invocation state: clock, platform, environment, working directory
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// Logical "now" for naming, retention and log timestamps
    pub now: DateTime<Utc>,
    /// Platform whose conventions (paths, scheduler) apply
    pub platform: Platform,
    /// Environment snapshot
    pub env: BTreeMap<String, String>,
    /// Working directory for resolving relative arguments
    pub cwd: PathBuf,
}

impl RuntimeContext {
    /// Build a context from the running process.
    ///
    /// `ZEN_BACKUP_TEST_NOW` (RFC 3339 or `YYYY-MM-DD`) and `ZEN_BACKUP_TEST_OS`
    /// override the clock and platform; they are read here and nowhere else.
    pub fn from_process() -> Result<Self, BackupError> {
        let env: BTreeMap<String, String> = std::env::vars().collect();

        let now = match env.get("ZEN_BACKUP_TEST_NOW").filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_now(raw)?,
            None => Utc::now(),
        };

        let platform = match env.get("ZEN_BACKUP_TEST_OS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None => Platform::host().ok_or_else(|| {
                BackupError::UnsupportedPlatform(std::env::consts::OS.to_string())
            })?,
        };

        let cwd = std::env::current_dir()
            .map_err(|e| BackupError::Io(format!("Failed to read working directory: {}", e)))?;

        Ok(Self {
            now,
            platform,
            env,
            cwd,
        })
    }

    /// Build a context with an explicit environment (useful for testing)
    pub fn new(
        now: DateTime<Utc>,
        platform: Platform,
        env: BTreeMap<String, String>,
        cwd: PathBuf,
    ) -> Self {
        Self {
            now,
            platform,
            env,
            cwd,
        }
    }

    /// Non-empty environment value
    pub fn var(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// True when the variable is set to `1`
    pub fn flag(&self, key: &str) -> bool {
        self.var(key) == Some("1")
    }

    /// Home directory: HOME, then USERPROFILE, then the working directory
    pub fn home_dir(&self) -> PathBuf {
        self.var("HOME")
            .or_else(|| self.var("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| self.cwd.clone())
    }

    /// Roaming application data directory (Windows layout)
    pub fn app_data_dir(&self) -> PathBuf {
        self.var("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.home_dir().join("AppData").join("Roaming"))
    }

    /// Calendar day of `now`, in UTC
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}

fn parse_now(raw: &str) -> Result<DateTime<Utc>, BackupError> {
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Ok(value.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| BackupError::Config(format!("Invalid ZEN_BACKUP_TEST_NOW value: {}", raw)))
}
