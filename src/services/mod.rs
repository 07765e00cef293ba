//! Service layer for zen-backup
//!
//! One orchestrator per command. Services load nothing from the process
//! themselves: configuration, clock and environment come in through the
//! `RuntimeContext`, and results come back as report types for the CLI to
//! print.

pub mod backup;
pub mod install;
pub mod list;
pub mod restore;
pub mod schedule;
pub mod status;
pub mod uninstall;

pub use backup::{BackupReport, BackupService};
pub use install::{install, InstallReport};
pub use list::list_backups;
pub use restore::restore_profile;
pub use schedule::{run_schedule, ScheduleAction};
pub use status::{collect_status, StatusReport};
pub use uninstall::{uninstall, UninstallReport};
