//! SQLite safe-copy
//!
//! Copies a live database without corrupting it. The online backup API is
//! tried first; when the source is locked by another process the file is
//! copied raw together with its `-wal`/`-shm` siblings, the copy is
//! checkpointed and the siblings are removed. Either way the destination must
//! pass `PRAGMA integrity_check` before the copy counts as done.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::backup::{Backup, StepResult};
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{BackupError, BackupResult};

/// How long the online backup waits on a locked source before giving up
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Suffixes of the companion files SQLite keeps next to a database
const SIBLING_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

/// Outcome of a successful safe-copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOutcome {
    /// True if the raw-copy fallback was needed (the source was busy)
    pub used_fallback: bool,
}

/// True for files handled as databases: `.sqlite` and `.db`
pub fn is_database_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".sqlite") || n.ends_with(".db"))
        .unwrap_or(false)
}

/// Copy `source` to `dest` in a verifiably consistent state
pub fn safe_copy(source: &Path, dest: &Path) -> BackupResult<CopyOutcome> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| BackupError::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    let used_fallback = match online_backup(source, dest) {
        Ok(()) => false,
        Err(e) => {
            debug!(source = %source.display(), error = %e, "online backup failed, copying raw");
            fallback_copy(source, dest)?;
            true
        }
    };

    integrity_check(dest)?;
    Ok(CopyOutcome { used_fallback })
}

fn online_backup(source: &Path, dest: &Path) -> BackupResult<()> {
    let src = Connection::open_with_flags(
        source,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    src.busy_timeout(BUSY_TIMEOUT)?;

    let mut dst = Connection::open(dest)?;
    let backup = Backup::new(&src, &mut dst)?;

    // Copy all pages in one step
    match backup.step(-1)? {
        StepResult::Done => Ok(()),
        other => Err(BackupError::Database(format!(
            "online backup of {} did not complete: {:?}",
            source.display(),
            other
        ))),
    }
}

fn fallback_copy(source: &Path, dest: &Path) -> BackupResult<()> {
    // Whatever a failed online backup left behind is discarded
    remove_with_siblings(dest);

    std::fs::copy(source, dest).map_err(|e| {
        BackupError::Io(format!("Failed to copy {}: {}", source.display(), e))
    })?;

    for suffix in SIBLING_SUFFIXES {
        let sibling = with_suffix(source, suffix);
        if sibling.exists() {
            std::fs::copy(&sibling, with_suffix(dest, suffix)).map_err(|e| {
                BackupError::Io(format!("Failed to copy {}: {}", sibling.display(), e))
            })?;
        }
    }

    // A copy that can't be checkpointed is left for the integrity check to judge
    if let Err(e) = checkpoint(dest) {
        debug!(dest = %dest.display(), error = %e, "checkpoint of fallback copy failed");
    }

    for suffix in SIBLING_SUFFIXES {
        let _ = std::fs::remove_file(with_suffix(dest, suffix));
    }

    debug!(dest = %dest.display(), "fallback copy checkpointed");
    Ok(())
}

fn checkpoint(path: &Path) -> BackupResult<()> {
    let conn = Connection::open(path)?;
    conn.query_row("PRAGMA wal_checkpoint(FULL)", [], |_| Ok(()))?;
    Ok(())
}

/// Run `PRAGMA integrity_check` and require `ok`
pub fn integrity_check(path: &Path) -> BackupResult<()> {
    // Read-write without create, so closing the connection cleans up any WAL
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| BackupError::integrity(path, e.to_string()))?;

    let result: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .map_err(|e| BackupError::integrity(path, e.to_string()))?;

    if result.trim().eq_ignore_ascii_case("ok") {
        Ok(())
    } else {
        Err(BackupError::integrity(path, result))
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Delete a database file along with its `-wal`, `-shm` and `-journal` files
pub fn remove_with_siblings(path: &Path) {
    let _ = std::fs::remove_file(path);
    for suffix in SIBLING_SUFFIXES.iter().chain(["-journal"].iter()) {
        let _ = std::fs::remove_file(with_suffix(path, suffix));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Create a small valid database with one table and `rows` rows
    pub(crate) fn create_test_db(path: &Path, rows: i64) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch("CREATE TABLE moz_places (id INTEGER PRIMARY KEY, url TEXT);")
            .unwrap();
        for i in 0..rows {
            conn.execute(
                "INSERT INTO moz_places (url) VALUES (?1)",
                [format!("https://example.com/{}", i)],
            )
            .unwrap();
        }
    }

    fn row_count(path: &Path) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.query_row("SELECT COUNT(*) FROM moz_places", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_is_database_file() {
        assert!(is_database_file(Path::new("places.sqlite")));
        assert!(is_database_file(Path::new("storage/x/idb.db")));
        assert!(!is_database_file(Path::new("places.sqlite-wal")));
        assert!(!is_database_file(Path::new("prefs.js")));
    }

    #[test]
    fn test_online_copy() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("places.sqlite");
        let dest = temp.path().join("out").join("places.sqlite");
        create_test_db(&source, 10);

        let outcome = safe_copy(&source, &dest).unwrap();
        assert!(!outcome.used_fallback);
        assert_eq!(row_count(&dest), 10);
    }

    #[test]
    fn test_online_copy_of_wal_database() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("places.sqlite");
        let dest = temp.path().join("copy.sqlite");
        create_test_db(&source, 0);

        // Keep a writer open so the rows only live in the WAL
        let writer = Connection::open(&source).unwrap();
        writer
            .query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))
            .unwrap();
        writer
            .execute("INSERT INTO moz_places (url) VALUES ('https://wal.example')", [])
            .unwrap();

        safe_copy(&source, &dest).unwrap();
        assert_eq!(row_count(&dest), 1);
    }

    #[test]
    fn test_fallback_when_source_locked() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("places.sqlite");
        let dest = temp.path().join("copy.sqlite");
        create_test_db(&source, 3);

        let locker = Connection::open(&source).unwrap();
        locker.execute_batch("BEGIN EXCLUSIVE;").unwrap();

        let outcome = safe_copy(&source, &dest).unwrap();
        assert!(outcome.used_fallback);
        assert_eq!(row_count(&dest), 3);

        locker.execute_batch("ROLLBACK;").unwrap();
    }

    #[test]
    fn test_integrity_check_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.sqlite");
        std::fs::write(&path, b"this is not a database, just some text padding it out").unwrap();

        let err = integrity_check(&path).unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn test_safe_copy_of_garbage_fails() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("broken.sqlite");
        std::fs::write(&source, vec![0x42u8; 4096]).unwrap();

        let err = safe_copy(&source, &temp.path().join("copy.sqlite")).unwrap_err();
        assert!(err.is_integrity(), "unexpected error: {}", err);
    }
}
