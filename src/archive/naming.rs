//! Archive filenames
//!
//! `zen-backup-<kind>-YYYY-MM-DD[-<n>].tar.gz`. The embedded date is the only
//! date retention and listing ever look at.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::models::BackupKind;

/// Prefix shared by every archive name
pub const ARCHIVE_PREFIX: &str = "zen-backup";

/// Compression extension
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Parsed archive filename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveName {
    pub kind: BackupKind,
    /// Calendar day (UTC) of the backup
    pub date: NaiveDate,
    /// Collision suffix; `None` for the first archive of the day
    pub disambiguator: Option<u32>,
}

impl ArchiveName {
    pub fn new(kind: BackupKind, date: NaiveDate) -> Self {
        Self {
            kind,
            date,
            disambiguator: None,
        }
    }

    /// Parse a bare filename; `None` if it doesn't follow the grammar
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name
            .strip_prefix(ARCHIVE_PREFIX)?
            .strip_prefix('-')?
            .strip_suffix(ARCHIVE_EXTENSION)?;

        let (kind, rest) = rest.split_once('-')?;
        let kind = match kind {
            "daily" => BackupKind::Daily,
            "weekly" => BackupKind::Weekly,
            _ => return None,
        };

        // YYYY-MM-DD is exactly ten characters
        if rest.len() < 10 || !rest.is_char_boundary(10) {
            return None;
        }
        let (date_part, suffix) = rest.split_at(10);
        if !is_date_shape(date_part) {
            return None;
        }
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;

        let disambiguator = if suffix.is_empty() {
            None
        } else {
            let digits = suffix.strip_prefix('-')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some(digits.parse().ok()?)
        };

        Some(Self {
            kind,
            date,
            disambiguator,
        })
    }

    /// Parse the filename component of a path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name().and_then(|n| n.to_str()).and_then(Self::parse)
    }

    pub fn with_disambiguator(self, n: u32) -> Self {
        Self {
            disambiguator: Some(n),
            ..self
        }
    }
}

fn is_date_shape(s: &str) -> bool {
    s.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    })
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            ARCHIVE_PREFIX,
            self.kind,
            self.date.format("%Y-%m-%d")
        )?;
        if let Some(n) = self.disambiguator {
            write!(f, "-{}", n)?;
        }
        f.write_str(ARCHIVE_EXTENSION)
    }
}

/// First free archive path in `dir` for `kind` on `date`.
///
/// The plain name is used if free; otherwise `-2`, `-3`, ... is inserted
/// before the extension until a free name is found.
pub fn next_archive_path(dir: &Path, kind: BackupKind, date: NaiveDate) -> PathBuf {
    let base = ArchiveName::new(kind, date);
    let first = dir.join(base.to_string());
    if !first.exists() {
        return first;
    }

    let mut suffix = 2;
    loop {
        let candidate = dir.join(base.with_disambiguator(suffix).to_string());
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format() {
        let name = ArchiveName::new(BackupKind::Daily, date(2026, 1, 15));
        assert_eq!(name.to_string(), "zen-backup-daily-2026-01-15.tar.gz");
        assert_eq!(
            name.with_disambiguator(3).to_string(),
            "zen-backup-daily-2026-01-15-3.tar.gz"
        );
    }

    #[test]
    fn test_parse() {
        let name = ArchiveName::parse("zen-backup-weekly-2026-02-01-2.tar.gz").unwrap();
        assert_eq!(name.kind, BackupKind::Weekly);
        assert_eq!(name.date, date(2026, 2, 1));
        assert_eq!(name.disambiguator, Some(2));

        let name = ArchiveName::parse("zen-backup-daily-2026-02-01.tar.gz").unwrap();
        assert_eq!(name.disambiguator, None);
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        for name in [
            "backup.log",
            ".DS_Store",
            "zen-backup-monthly-2026-01-01.tar.gz",
            "zen-backup-daily-2026-1-01.tar.gz",
            "zen-backup-daily-2026-13-01.tar.gz",
            "zen-backup-daily-2026-01-01-.tar.gz",
            "zen-backup-daily-2026-01-01-x.tar.gz",
            "zen-backup-daily-2026-01-01.zip",
            "other-daily-2026-01-01.tar.gz",
        ] {
            assert!(ArchiveName::parse(name).is_none(), "{} should not parse", name);
        }
    }

    #[test]
    fn test_collision_suffixes() {
        let temp = TempDir::new().unwrap();
        let day = date(2026, 1, 15);

        let first = next_archive_path(temp.path(), BackupKind::Daily, day);
        assert!(first.ends_with("zen-backup-daily-2026-01-15.tar.gz"));
        std::fs::write(&first, b"x").unwrap();

        let second = next_archive_path(temp.path(), BackupKind::Daily, day);
        assert!(second.ends_with("zen-backup-daily-2026-01-15-2.tar.gz"));
        std::fs::write(&second, b"x").unwrap();

        let third = next_archive_path(temp.path(), BackupKind::Daily, day);
        assert!(third.ends_with("zen-backup-daily-2026-01-15-3.tar.gz"));
    }
}
