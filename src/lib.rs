//! zen-backup - scheduled backups of a Zen browser profile
//!
//! This library provides the backup agent behind the `zen-backup` binary:
//! consistent archives of a live browser profile, retention, restore with a
//! rollback-safe profile swap, and scheduled jobs on launchd, systemd user
//! timers and Windows Task Scheduler.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings file location, loading and path expansion
//! - `context`: Per-invocation clock, platform and environment
//! - `error`: Custom error types
//! - `models`: Backup kinds, schedules and job states
//! - `sqlite`: Consistent copies and integrity checks of live databases
//! - `archive`: Archive naming, creation, inventory and retention
//! - `restore`: Archive validation and profile restore
//! - `scheduler`: OS scheduler backends with host and simulated control
//! - `services`: One orchestrator per command
//! - `audit`: The user-facing backup log
//! - `cli`: Command handlers and output formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use zen_backup::config::BackupConfig;
//! use zen_backup::context::RuntimeContext;
//! use zen_backup::models::BackupKind;
//! use zen_backup::services::BackupService;
//!
//! let ctx = RuntimeContext::from_process()?;
//! let config = BackupConfig::load(&ctx)?;
//! let report = BackupService::new(&config, &ctx).run(BackupKind::Daily)?;
//! ```

pub mod archive;
pub mod audit;
pub mod browser;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod process;
pub mod restore;
pub mod scheduler;
pub mod services;
pub mod sqlite;

pub use error::BackupError;
