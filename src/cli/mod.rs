//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod schedule;
pub mod setup;
pub mod status;

pub use backup::{handle_backup_command, handle_list_command, handle_restore_command};
pub use schedule::handle_schedule_command;
pub use setup::{handle_install_command, handle_uninstall_command};
pub use status::handle_status_command;

use crate::error::BackupError;

/// Follow-up advice printed under an error, if there is any
pub fn hint_for(err: &BackupError) -> Option<&'static str> {
    match err {
        BackupError::NotFound { entity_type, .. } if *entity_type == "config file" => {
            Some("Run \"zen-backup install\" to configure backups.")
        }
        BackupError::CloudSync(_) => Some("The local backup was created."),
        _ => None,
    }
}
