//! Path management for zen-backup
//!
//! Resolves the settings file location and expands user-supplied paths.
//!
//! ## Path Resolution Order
//!
//! 1. `ZEN_BACKUP_CONFIG` environment variable (if set, relative to the working directory)
//! 2. Windows: `%APPDATA%\zen-profile-backup\settings.toml`
//! 3. Everywhere else: `~/.config/zen-profile-backup/settings.toml`

use std::path::{Path, PathBuf};

use crate::context::{Platform, RuntimeContext};
use crate::error::BackupError;

/// Directory name shared by the settings file and the Windows task definitions
pub const APP_DIR_NAME: &str = "zen-profile-backup";

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV_VAR: &str = "ZEN_BACKUP_CONFIG";

/// Manages the paths zen-backup owns outside the backup root
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Full path of the settings file
    settings_file: PathBuf,
}

impl ConfigPaths {
    /// Resolve the settings file for this invocation
    pub fn resolve(ctx: &RuntimeContext) -> Self {
        let settings_file = if let Some(custom) = ctx.var(CONFIG_ENV_VAR) {
            ctx.cwd.join(custom)
        } else {
            default_config_dir(ctx).join(SETTINGS_FILE_NAME)
        };

        Self { settings_file }
    }

    /// Create ConfigPaths with an explicit settings file (useful for testing)
    pub fn with_settings_file(settings_file: PathBuf) -> Self {
        Self { settings_file }
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    /// Directory holding the settings file; relative config paths resolve here
    pub fn config_dir(&self) -> PathBuf {
        self.settings_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Ensure the settings directory exists
    pub fn ensure_directories(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(self.config_dir()).map_err(|e| {
            BackupError::Io(format!("Failed to create config directory: {}", e))
        })
    }

    /// Check if zen-backup has been installed (settings file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file.exists()
    }
}

/// Platform default for the settings directory
fn default_config_dir(ctx: &RuntimeContext) -> PathBuf {
    match ctx.platform {
        Platform::Windows => ctx.app_data_dir().join(APP_DIR_NAME),
        Platform::MacOs | Platform::Linux => ctx.home_dir().join(".config").join(APP_DIR_NAME),
    }
}

/// Expand `~`, `$VAR`, `${VAR}` and `%VAR%` in a user-supplied path.
///
/// Unknown variables expand to the empty string. A relative result is
/// resolved against `base_dir` when one is given.
pub fn expand_path(input: &str, ctx: &RuntimeContext, base_dir: Option<&Path>) -> PathBuf {
    let mut value = input.trim().to_string();

    if value == "~" {
        value = ctx.home_dir().display().to_string();
    } else if let Some(rest) = value.strip_prefix("~/").or_else(|| value.strip_prefix("~\\")) {
        value = ctx.home_dir().join(rest).display().to_string();
    }

    let value = expand_variables(&value, ctx);
    let path = PathBuf::from(value);

    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}

fn expand_variables(input: &str, ctx: &RuntimeContext) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '$' if chars.get(i + 1) == Some(&'{') => {
                if let Some(end) = chars[i + 2..].iter().position(|c| *c == '}') {
                    let name: String = chars[i + 2..i + 2 + end].iter().collect();
                    if is_var_name(&name) {
                        out.push_str(ctx.var(&name).unwrap_or(""));
                        i += end + 3;
                        continue;
                    }
                }
                out.push('$');
                i += 1;
            }
            '$' => {
                let len = chars[i + 1..]
                    .iter()
                    .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
                    .count();
                let name: String = chars[i + 1..i + 1 + len].iter().collect();
                if len > 0 && is_var_name(&name) {
                    out.push_str(ctx.var(&name).unwrap_or(""));
                    i += len + 1;
                } else {
                    out.push('$');
                    i += 1;
                }
            }
            '%' => {
                if let Some(end) = chars[i + 1..].iter().position(|c| *c == '%') {
                    let name: String = chars[i + 1..i + 1 + end].iter().collect();
                    if is_var_name(&name) {
                        out.push_str(ctx.var(&name).unwrap_or(""));
                        i += end + 2;
                        continue;
                    }
                }
                out.push('%');
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn is_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Find the first placeholder token a shell or the OS would have expanded:
/// a leading `~`, `$VAR`, `${VAR}` or `%VAR%`.
pub fn find_unexpanded_token(text: &str) -> Option<String> {
    for word in text.split(|c: char| c.is_whitespace() || c == '"' || c == '<' || c == '>' || c == '=') {
        if word == "~" || word.starts_with("~/") || word.starts_with("~\\") {
            return Some(word.to_string());
        }
    }

    let chars: Vec<char> = text.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        match c {
            '$' => {
                let rest: String = chars[i + 1..].iter().collect();
                if let Some(inner) = rest.strip_prefix('{') {
                    if let Some(end) = inner.find('}') {
                        if is_var_name(&inner[..end]) {
                            return Some(format!("${{{}}}", &inner[..end]));
                        }
                    }
                }
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                if is_var_name(&name) {
                    return Some(format!("${}", name));
                }
            }
            '%' => {
                let rest: String = chars[i + 1..].iter().collect();
                if let Some(end) = rest.find('%') {
                    if is_var_name(&rest[..end]) {
                        return Some(format!("%{}%", &rest[..end]));
                    }
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn ctx(platform: Platform, env: &[(&str, &str)]) -> RuntimeContext {
        let env: BTreeMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RuntimeContext::new(Utc::now(), platform, env, PathBuf::from("/work"))
    }

    #[test]
    fn test_default_settings_file_unix() {
        let paths = ConfigPaths::resolve(&ctx(Platform::Linux, &[("HOME", "/home/u")]));
        assert_eq!(
            paths.settings_file(),
            Path::new("/home/u/.config/zen-profile-backup/settings.toml")
        );
    }

    #[test]
    fn test_default_settings_file_windows() {
        let paths = ConfigPaths::resolve(&ctx(
            Platform::Windows,
            &[("USERPROFILE", "/users/u"), ("APPDATA", "/users/u/roaming")],
        ));
        assert_eq!(
            paths.settings_file(),
            Path::new("/users/u/roaming")
                .join(APP_DIR_NAME)
                .join(SETTINGS_FILE_NAME)
        );
    }

    #[test]
    fn test_env_var_override() {
        let paths = ConfigPaths::resolve(&ctx(
            Platform::Linux,
            &[("HOME", "/home/u"), ("ZEN_BACKUP_CONFIG", "conf/settings.toml")],
        ));
        assert_eq!(paths.settings_file(), Path::new("/work/conf/settings.toml"));
        assert_eq!(paths.config_dir(), PathBuf::from("/work/conf"));
    }

    #[test]
    fn test_expand_home_and_vars() {
        let c = ctx(
            Platform::Linux,
            &[("HOME", "/home/u"), ("DATA", "/mnt/data"), ("APPDATA", "/roam")],
        );
        assert_eq!(expand_path("~", &c, None), PathBuf::from("/home/u"));
        assert_eq!(expand_path("~/zen", &c, None), PathBuf::from("/home/u/zen"));
        assert_eq!(expand_path("$DATA/b", &c, None), PathBuf::from("/mnt/data/b"));
        assert_eq!(expand_path("${DATA}/b", &c, None), PathBuf::from("/mnt/data/b"));
        assert_eq!(expand_path("%APPDATA%/z", &c, None), PathBuf::from("/roam/z"));
        assert_eq!(expand_path("$MISSING/x", &c, None), PathBuf::from("/x"));
    }

    #[test]
    fn test_expand_relative_against_base() {
        let c = ctx(Platform::Linux, &[("HOME", "/home/u")]);
        assert_eq!(
            expand_path("backups", &c, Some(Path::new("/etc/zen"))),
            PathBuf::from("/etc/zen/backups")
        );
        assert_eq!(
            expand_path("/abs", &c, Some(Path::new("/etc/zen"))),
            PathBuf::from("/abs")
        );
    }

    #[test]
    fn test_find_unexpanded_token() {
        assert_eq!(find_unexpanded_token("path=~/x"), Some("~/x".to_string()));
        assert_eq!(find_unexpanded_token("<string>$HOME/bin</string>"), Some("$HOME".to_string()));
        assert_eq!(find_unexpanded_token("a ${XDG_DATA_HOME} b"), Some("${XDG_DATA_HOME}".to_string()));
        assert_eq!(find_unexpanded_token("C:%USERPROFILE%\\x"), Some("%USERPROFILE%".to_string()));
        assert_eq!(find_unexpanded_token("/home/u/bin/zen-backup backup daily"), None);
        assert_eq!(find_unexpanded_token("OnCalendar=*-*-* 12:30:00"), None);
    }
}
