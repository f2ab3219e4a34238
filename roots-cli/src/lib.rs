//! ROOTS command line: wires the configured volume table and a HAL backend
//! into the volume lifecycle actions of `roots-core`.

pub mod cli;
pub mod confirm;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use roots_core::hooks::CommandHooks;
use roots_core::logs::RecoveryLogStash;
use roots_core::ui::ConsoleUi;
use roots_core::wipe::ConfirmFn;
use roots_core::{
    logging, setup_install_mounts, ConfigTableSource, MountManager, RootsConfig, VolumeFormatter,
    VolumeTable, WipeOrchestrator,
};
use roots_hal::{FakeHal, LinuxHal, SystemHal};
use std::path::Path;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = RootsConfig::load(&cli.config)?;
    logging::init(config.logging.file.as_deref());
    if let Some(warning) = config_warning(&cli.config, &config) {
        log::warn!("{}", warning);
    }

    let table = VolumeTable::load(&ConfigTableSource::new(&cli.config))
        .context("Failed to load volume table")?;

    if cli.dry_run {
        log::info!("dry run: no device will be touched");
        let hal = FakeHal::new();
        execute(&cli, &config, &table, &hal)?;
        for op in hal.mutations() {
            println!("{:?}", op);
        }
        Ok(())
    } else {
        let hal = LinuxHal::new().with_mke2fs(config.layout.mke2fs_program.clone());
        execute(&cli, &config, &table, &hal)
    }
}

/// Deferred until the logger is up, since loading happens before it exists.
pub fn config_warning(path: &Path, config: &RootsConfig) -> Option<String> {
    match config.source {
        Some(_) => None,
        None => Some(format!("{} not found; using default layout", path.display())),
    }
}

fn ask(cli: &Cli, prompt: &str) -> Result<bool> {
    if cli.yes {
        return Ok(true);
    }
    confirm::confirm_destructive_action(prompt)
}

pub fn execute<H: SystemHal>(
    cli: &Cli,
    config: &RootsConfig,
    table: &VolumeTable,
    hal: &H,
) -> Result<()> {
    // A dry run keeps host-side files (breadcrumb, saved logs) in a scratch directory.
    let scratch = if cli.dry_run {
        Some(tempfile::tempdir().context("Failed to create dry-run scratch directory")?)
    } else {
        None
    };
    let mut layout = config.layout.clone();
    let mut log_dir = layout.cache_log_dir();
    if let Some(dir) = &scratch {
        layout.convert_fbe_dir = dir.path().join("convert_fbe");
        log_dir = dir.path().join("recovery");
    }
    let layout = &layout;

    let mounts = MountManager::new(table, hal);
    let formatter = VolumeFormatter::new(&mounts, hal, hal, hal, layout);

    let ok = match &cli.command {
        Command::Table => {
            for line in table.describe() {
                println!("{}", line);
            }
            true
        }
        Command::Mount { path, at } => {
            mounts.ensure_mounted_at(path, at.as_deref())?;
            true
        }
        Command::Unmount { path } => {
            mounts.ensure_unmounted(path)?;
            true
        }
        Command::Format {
            mount_point,
            seed_dir,
        } => {
            let prompt = format!("Format {}? Everything on it is lost", mount_point.display());
            let ran = confirm::confirm_and_run_with(
                &prompt,
                |p| ask(cli, p),
                || Ok(formatter.format(mount_point, seed_dir.as_deref())?),
            )?;
            if !ran {
                log::info!("format cancelled");
            }
            true
        }
        Command::SetupInstallMounts => {
            setup_install_mounts(table, &mounts, layout)?;
            true
        }
        command => {
            let hooks = CommandHooks::new(hal, &config.hooks);
            let stash = RecoveryLogStash::new(&log_dir);
            let ui = ConsoleUi;
            let wiper = WipeOrchestrator::new(
                table, &mounts, &formatter, hal, &hooks, &stash, &ui, layout,
            );

            let prompt_fn = || confirm::confirmed("Wipe? This cannot be undone");
            let gate: ConfirmFn<'_> = if cli.yes { None } else { Some(&prompt_fn) };
            match command {
                Command::WipeCache => wiper.wipe_cache(gate),
                Command::WipeSystem => wiper.wipe_system(gate),
                Command::WipeDataKeepMedia => wiper.wipe_data_exclude_media(gate),
                Command::WipeData { convert_fbe } => {
                    if ask(cli, "Wipe all user data? This cannot be undone")? {
                        wiper.wipe_data(*convert_fbe)
                    } else {
                        log::info!("data wipe cancelled");
                        true
                    }
                }
                _ => true,
            }
        }
    };

    if !ok {
        bail!("{:?} failed", cli.command);
    }
    Ok(())
}
