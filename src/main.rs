use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use zen_backup::cli::{
    handle_backup_command, handle_install_command, handle_list_command, handle_restore_command,
    handle_schedule_command, handle_status_command, handle_uninstall_command, hint_for,
};
use zen_backup::config::paths::CONFIG_ENV_VAR;
use zen_backup::context::RuntimeContext;
use zen_backup::error::{BackupError, BackupResult};
use zen_backup::models::BackupKind;
use zen_backup::services::ScheduleAction;

#[derive(Parser)]
#[command(
    name = "zen-backup",
    version,
    about = "Scheduled backups of the Zen browser profile",
    long_about = "zen-backup archives the Zen browser profile on a daily and weekly \
                  schedule, copies archives to a cloud-synced folder, prunes old \
                  archives and restores a profile from any archive."
)]
struct Cli {
    /// Enable debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a backup archive now
    Backup {
        /// daily or weekly
        kind: BackupKind,
    },

    /// Restore the profile from an archive
    Restore {
        /// Archive path or file name inside the backup directory
        archive: String,
    },

    /// List backup archives
    #[command(alias = "ls")]
    List,

    /// Show configuration, archives and scheduler state
    Status,

    /// Write settings and install the scheduled jobs
    Install,

    /// Remove the scheduled jobs and settings
    Uninstall {
        /// Also delete every backup archive
        #[arg(long)]
        purge_backups: bool,
    },

    /// Pause, resume or inspect the scheduled jobs
    Schedule {
        /// start|resume|stop|pause|status
        #[arg(default_value = "status")]
        action: ScheduleAction,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    zen_backup::logging::init(cli.verbose);

    let mut ctx = RuntimeContext::from_process()?;
    if let Some(config) = &cli.config {
        ctx.env
            .insert(CONFIG_ENV_VAR.to_string(), config.display().to_string());
    }

    let Some(command) = cli.command else {
        println!("zen-backup - Zen browser profile backups");
        println!();
        println!("Run 'zen-backup --help' for usage information.");
        println!("Run 'zen-backup install' to set up scheduled backups.");
        return Ok(());
    };

    if let Err(err) = run(command, &ctx) {
        eprintln!("Error: {}", err);
        if let Some(hint) = hint_for(&err) {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run(command: Commands, ctx: &RuntimeContext) -> BackupResult<()> {
    match command {
        Commands::Backup { kind } => handle_backup_command(ctx, kind),
        Commands::Restore { archive } => handle_restore_command(ctx, &archive),
        Commands::List => handle_list_command(ctx),
        Commands::Status => handle_status_command(ctx),
        Commands::Install => {
            let executable = std::env::current_exe().map_err(|e| {
                BackupError::Io(format!("Failed to locate the zen-backup executable: {}", e))
            })?;
            handle_install_command(ctx, &executable)
        }
        Commands::Uninstall { purge_backups } => handle_uninstall_command(ctx, purge_backups),
        Commands::Schedule { action } => handle_schedule_command(ctx, action),
    }
}
