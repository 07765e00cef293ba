//! Archive inventory
//!
//! Lists the archives under a backup root for `list` and `status`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::naming::{ArchiveName, ARCHIVE_EXTENSION};
use crate::error::{BackupError, BackupResult};
use crate::models::BackupKind;

/// Metadata about an archive on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub kind: BackupKind,
    /// Archive filename
    pub name: String,
    /// Full path to the archive
    pub path: PathBuf,
    /// Size in bytes
    pub size_bytes: u64,
    /// Date embedded in the name; `None` for files that don't follow the grammar
    pub date: Option<NaiveDate>,
    disambiguator: u32,
}

/// Every `*.tar.gz` file in `<root>/daily` and `<root>/weekly`, oldest first.
///
/// A missing kind directory counts as empty.
pub fn list_archives(root: &Path) -> BackupResult<Vec<ArchiveInfo>> {
    let mut archives = Vec::new();

    for kind in BackupKind::ALL {
        let dir = root.join(kind.as_str());
        if !dir.is_dir() {
            continue;
        }

        for entry in fs::read_dir(&dir)
            .map_err(|e| BackupError::Io(format!("Failed to read {}: {}", dir.display(), e)))?
        {
            let entry = entry
                .map_err(|e| BackupError::Io(format!("Failed to read directory entry: {}", e)))?;

            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(ARCHIVE_EXTENSION) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };

            let parsed = ArchiveName::parse(&name);
            archives.push(ArchiveInfo {
                kind,
                path: entry.path(),
                size_bytes: metadata.len(),
                date: parsed.map(|n| n.date),
                disambiguator: parsed.and_then(|n| n.disambiguator).unwrap_or(1),
                name,
            });
        }
    }

    archives.sort_by(|a, b| {
        (a.kind, a.date, a.disambiguator, &a.name).cmp(&(b.kind, b.date, b.disambiguator, &b.name))
    });

    Ok(archives)
}

/// Most recent archive of `kind` in an inventory from `list_archives`
pub fn newest_archive(archives: &[ArchiveInfo], kind: BackupKind) -> Option<&ArchiveInfo> {
    archives.iter().rev().find(|a| a.kind == kind)
}

/// Format a size in bytes for humans (`512 B`, `1.5 KB`, `2.0 MB`)
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
