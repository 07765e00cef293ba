//! Configuration module for zen-backup
//!
//! This module provides configuration management including:
//! - Settings file location per platform
//! - Path expansion for user-supplied paths
//! - TOML settings persistence and validation

pub mod paths;
pub mod settings;

pub use paths::ConfigPaths;
pub use settings::{BackupConfig, Retention, Settings};
