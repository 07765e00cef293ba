//! Archive validation
//!
//! Every entry is listed before anything is written. One unsafe entry
//! rejects the whole archive.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::error::{BackupError, BackupResult};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One listed archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path as stored in the archive
    pub path: String,
    /// Link target for symlink and hard-link entries
    pub link: Option<String>,
    pub is_symlink: bool,
}

/// List the entries of a gzip-compressed tar archive.
///
/// Anything that can't be read as one is `InvalidArchive`.
pub fn list_entries(archive_path: &Path) -> BackupResult<Vec<ArchiveEntry>> {
    let label = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_path.display().to_string());
    let invalid = |detail: String| BackupError::InvalidArchive(format!("{} ({})", label, detail));

    let mut file = File::open(archive_path)
        .map_err(|e| BackupError::Io(format!("Failed to open archive: {}", e)))?;

    let mut magic = [0u8; 2];
    if file.read_exact(&mut magic).is_err() || magic != GZIP_MAGIC {
        return Err(invalid("not a gzip stream".into()));
    }
    let file = File::open(archive_path)
        .map_err(|e| BackupError::Io(format!("Failed to open archive: {}", e)))?;

    let mut archive = Archive::new(GzDecoder::new(file));
    let mut listed = Vec::new();

    for entry in archive.entries().map_err(|e| invalid(e.to_string()))? {
        let entry = entry.map_err(|e| invalid(e.to_string()))?;
        let path = entry.path().map_err(|e| invalid(e.to_string()))?;
        let entry_type = entry.header().entry_type();
        let link = match entry_type {
            EntryType::Symlink | EntryType::Link => entry
                .link_name()
                .map_err(|e| invalid(e.to_string()))?
                .map(|l| l.to_string_lossy().into_owned()),
            _ => None,
        };

        listed.push(ArchiveEntry {
            path: path.to_string_lossy().into_owned(),
            link,
            is_symlink: entry_type == EntryType::Symlink,
        });
    }

    Ok(listed)
}

/// List and validate an archive; returns the entries if all are safe
pub fn validate_archive(archive_path: &Path) -> BackupResult<Vec<ArchiveEntry>> {
    let entries = list_entries(archive_path)?;

    for entry in &entries {
        if is_unsafe_path(&entry.path) || link_escapes(entry) {
            return Err(BackupError::InvalidArchive(format!(
                "unsafe entry: {}",
                entry.path
            )));
        }
    }

    Ok(entries)
}

/// Trim, use `/` separators, strip leading `./` and `/`
pub fn sanitize_entry(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    loop {
        if let Some(rest) = value.strip_prefix("./") {
            value = rest.to_string();
        } else if let Some(rest) = value.strip_prefix('/') {
            value = rest.to_string();
        } else {
            return value;
        }
    }
}

/// A `..` segment, or a drive-letter prefix like `C:/`
pub fn is_unsafe_path(raw: &str) -> bool {
    let candidate = sanitize_entry(raw);
    candidate.split('/').any(|segment| segment == "..") || has_drive_prefix(&candidate)
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

/// Whether a link entry points outside the extraction root
fn link_escapes(entry: &ArchiveEntry) -> bool {
    let Some(target) = entry.link.as_deref() else {
        return false;
    };
    let normalized = target.trim().replace('\\', "/");
    if normalized.starts_with('/') || has_drive_prefix(&normalized) {
        return true;
    }

    // Symlinks resolve from the link's directory, hard links from the root
    let mut depth: i64 = if entry.is_symlink {
        let entry_path = sanitize_entry(&entry.path);
        entry_path.split('/').filter(|s| !s.is_empty()).count() as i64 - 1
    } else {
        0
    };

    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            _ => depth += 1,
        }
    }
    false
}
