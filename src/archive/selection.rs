//! Profile entry selection
//!
//! Everything is captured unless it is sensitive (credentials, cookies, the
//! profile lock), a database companion file, or cache/telemetry/crash data.

/// Files never captured, matched by exact filename
const EXCLUDED_FILES: [&str; 5] = [
    "cookies.sqlite",
    "key4.db",
    "logins.json",
    "cert9.db",
    ".parentlock",
];

/// Database companion files; the safe-copy folds them into the main file
const EXCLUDED_SUFFIXES: [&str; 4] = [".sqlite-wal", ".sqlite-shm", ".db-wal", ".db-shm"];

/// Cache, telemetry and crash report directories
const EXCLUDED_DIR_PREFIXES: [&str; 7] = [
    "cache2/",
    "crashes/",
    "datareporting/",
    "saved-telemetry-pings/",
    "minidumps/",
    "storage/temporary/",
    "storage/default/chrome/",
];

/// Site storage directory whose HTTP cache children are skipped
const SITE_STORAGE_DIR: &str = "storage/default";
const HTTP_STORAGE_PREFIX: &str = "storage/default/http";

/// Whether the entry at `relative_path` (relative to the profile root) is
/// captured. Backslashes are treated as separators.
pub fn should_include(relative_path: &str, is_dir: bool) -> bool {
    let normalized = relative_path.replace('\\', "/");
    let normalized = normalized.trim_start_matches("./").trim_end_matches('/');
    let file_name = normalized.rsplit('/').next().unwrap_or(normalized);

    if EXCLUDED_FILES.contains(&file_name) {
        return false;
    }

    if EXCLUDED_SUFFIXES.iter().any(|s| file_name.ends_with(s)) {
        return false;
    }

    for prefix in EXCLUDED_DIR_PREFIXES {
        if normalized == prefix.trim_end_matches('/') || normalized.starts_with(prefix) {
            return false;
        }
    }

    if normalized == SITE_STORAGE_DIR && is_dir {
        return true;
    }

    !normalized.starts_with(HTTP_STORAGE_PREFIX)
}
