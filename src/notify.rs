//! Desktop notifications
//!
//! Delivery is best-effort: a missing or hanging helper never fails the
//! operation that wanted to notify. Every notification is also recorded in
//! `<backup root>/notifications.log`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::config::BackupConfig;
use crate::context::{Platform, RuntimeContext};
use crate::process::run_bounded;

/// Notification record file inside the backup root
pub const NOTIFICATIONS_FILE_NAME: &str = "notifications.log";

const HELPER_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can tell the user about a problem
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
}

/// Notifications switched off in the settings
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    fn notify(&self, _title: &str, _message: &str) {}
}

/// Records notifications without delivering them
pub struct NotificationLog {
    path: PathBuf,
    platform: Platform,
    now: DateTime<Utc>,
}

impl NotificationLog {
    pub fn new(backup_root: &Path, platform: Platform, now: DateTime<Utc>) -> Self {
        Self {
            path: backup_root.join(NOTIFICATIONS_FILE_NAME),
            platform,
            now,
        }
    }

    fn record(&self, backend: &str, title: &str, message: &str) {
        let line = format!(
            "[{}] {} ({}): {} :: {}",
            self.now.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.platform,
            backend,
            title,
            message
        );

        let written = self
            .path
            .parent()
            .map(std::fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| OpenOptions::new().create(true).append(true).open(&self.path))
            .and_then(|mut file| writeln!(file, "{}", line));

        if let Err(e) = written {
            debug!(error = %e, "failed to record notification");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, title: &str, message: &str) {
        self.record("log-only", title, message);
    }
}

/// Delivers through the platform's notification helper
pub struct DesktopNotifier {
    log: NotificationLog,
}

impl DesktopNotifier {
    pub fn new(log: NotificationLog) -> Self {
        Self { log }
    }

    fn deliver(&self, title: &str, message: &str) -> &'static str {
        let (backend, program, args) = match self.log.platform {
            Platform::MacOs => (
                "osascript",
                "osascript",
                vec![
                    "-e".to_string(),
                    format!(
                        "display notification \"{}\" with title \"{}\"",
                        escape_quoted(message),
                        escape_quoted(title)
                    ),
                ],
            ),
            Platform::Linux => (
                "notify-send",
                "notify-send",
                vec![title.to_string(), message.to_string()],
            ),
            Platform::Windows => (
                "powershell",
                "powershell",
                vec![
                    "-NoProfile".to_string(),
                    "-Command".to_string(),
                    windows_toast_script(title, message),
                ],
            ),
        };

        match run_bounded(program, &args, HELPER_TIMEOUT) {
            Ok(outcome) if outcome.success => backend,
            Ok(outcome) => {
                debug!(backend, error = outcome.message(), "notification helper failed");
                "failed"
            }
            Err(e) => {
                debug!(backend, error = %e, "notification helper unavailable");
                "failed"
            }
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        let backend = self.deliver(title, message);
        self.log.record(backend, title, message);
    }
}

/// Notifier for this invocation: disabled, record-only
/// (`ZEN_BACKUP_NOTIFY=log`), or desktop delivery
pub fn notifier_for(config: &BackupConfig, ctx: &RuntimeContext) -> Box<dyn Notifier> {
    if !config.notifications_enabled {
        return Box::new(DisabledNotifier);
    }

    let log = NotificationLog::new(&config.backup_root, ctx.platform, ctx.now);
    if ctx.var("ZEN_BACKUP_NOTIFY") == Some("log") || Platform::host() != Some(ctx.platform) {
        Box::new(log)
    } else {
        Box::new(DesktopNotifier::new(log))
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn windows_toast_script(title: &str, message: &str) -> String {
    let escape = |s: &str| s.replace('\'', "''");
    format!(
        "[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] > $null; \
         $t = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); \
         $x = $t.GetElementsByTagName('text'); \
         $x.Item(0).AppendChild($t.CreateTextNode('{}')) > $null; \
         $x.Item(1).AppendChild($t.CreateTextNode('{}')) > $null; \
         [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('Zen Backup').Show([Windows.UI.Notifications.ToastNotification]::new($t))",
        escape(title),
        escape(message)
    )
}
