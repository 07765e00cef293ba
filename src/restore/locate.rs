//! Archive lookup

use std::path::{Path, PathBuf};

use crate::error::{BackupError, BackupResult};
use crate::models::BackupKind;

/// Resolve `input` to an existing archive file.
///
/// Tried in order: the literal path (relative to `cwd`), then the bare name
/// under `<backup_root>`, `<backup_root>/daily` and `<backup_root>/weekly`.
pub fn locate_archive(input: &str, backup_root: &Path, cwd: &Path) -> BackupResult<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(BackupError::Precondition("archive name is required".into()));
    }

    let mut candidates = vec![cwd.join(trimmed), backup_root.join(trimmed)];
    for kind in BackupKind::ALL {
        candidates.push(backup_root.join(kind.as_str()).join(trimmed));
    }

    candidates
        .into_iter()
        .find(|c| c.is_file())
        .ok_or_else(|| BackupError::archive_not_found(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("backups");
        let cwd = temp.path().join("work");
        fs::create_dir_all(root.join("weekly")).unwrap();
        fs::create_dir_all(&cwd).unwrap();

        let name = "zen-backup-weekly-2026-01-04.tar.gz";
        fs::write(root.join("weekly").join(name), b"x").unwrap();
        assert_eq!(
            locate_archive(name, &root, &cwd).unwrap(),
            root.join("weekly").join(name)
        );

        fs::write(cwd.join(name), b"x").unwrap();
        assert_eq!(locate_archive(name, &root, &cwd).unwrap(), cwd.join(name));
    }

    #[test]
    fn test_absolute_path() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.tar.gz");
        fs::write(&archive, b"x").unwrap();
        let arg = archive.display().to_string();

        assert_eq!(
            locate_archive(&arg, Path::new("/nonexistent"), Path::new("/")).unwrap(),
            archive
        );
    }

    #[test]
    fn test_not_found() {
        let temp = TempDir::new().unwrap();
        let err = locate_archive("missing.tar.gz", temp.path(), temp.path()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "archive not found: missing.tar.gz");
    }
}
