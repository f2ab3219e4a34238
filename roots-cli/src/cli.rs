use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "ROOTS recovery volume manager")]
pub struct Cli {
    /// Configuration with the volume table and layout
    #[arg(long, global = true, default_value = roots_core::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Skip interactive confirmation of destructive commands
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Record operations instead of touching devices
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the volume table
    Table,
    /// Mount the volume owning PATH
    Mount {
        path: PathBuf,
        /// Mount at this point instead of the volume's own
        #[arg(long)]
        at: Option<PathBuf>,
    },
    /// Unmount the volume owning PATH
    Unmount { path: PathBuf },
    /// Build a fresh filesystem on a volume
    Format {
        mount_point: PathBuf,
        /// Directory copied into the new ext4 filesystem
        #[arg(long)]
        seed_dir: Option<PathBuf>,
    },
    /// Mount /tmp and the cache, unmount everything else
    SetupInstallMounts,
    /// Reformat the cache, keeping recovery logs
    WipeCache,
    /// Factory reset: data, cache and metadata
    WipeData {
        /// Ask the next boot to use file-based encryption
        #[arg(long)]
        convert_fbe: bool,
    },
    /// Reformat the system volume
    WipeSystem,
    /// Delete user data but keep internal storage
    WipeDataKeepMedia,
}

impl Command {
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Command::Format { .. }
                | Command::WipeCache
                | Command::WipeData { .. }
                | Command::WipeSystem
                | Command::WipeDataKeepMedia
        )
    }
}
