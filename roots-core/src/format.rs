//! Filesystem-type-directed formatting of a single volume.
//!
//! Nothing here rolls back: a wiped key device stays wiped when the
//! filesystem build that follows it fails.

use crate::config::Layout;
use crate::errors::{VolumeError, VolumeResult};
use crate::mounts::MountManager;
use crate::volume::{FsType, Volume};
use roots_hal::{BlockWipeOps, CommandSpec, Ext4Request, FormatOps, HalError, ProcessOps};
use std::path::Path;

const SECTOR_SIZE: i64 = 512;

/// Arguments for `mkfs.f2fs`, chosen by the sign of `length`.
pub fn f2fs_command_spec(program: &str, device: &Path, length: i64) -> CommandSpec {
    let spec = CommandSpec::new(program).arg("-t1");
    let device = device.display().to_string();
    if length < 0 {
        spec.arg("-r").arg(length.unsigned_abs().to_string()).arg(device)
    } else if length > 0 {
        spec.arg(device).arg((length / SECTOR_SIZE).to_string())
    } else {
        spec.arg(device)
    }
}

pub struct VolumeFormatter<'a> {
    mounts: &'a MountManager<'a>,
    formatter: &'a dyn FormatOps,
    process: &'a dyn ProcessOps,
    wiper: &'a dyn BlockWipeOps,
    layout: &'a Layout,
}

impl<'a> VolumeFormatter<'a> {
    pub fn new(
        mounts: &'a MountManager<'a>,
        formatter: &'a dyn FormatOps,
        process: &'a dyn ProcessOps,
        wiper: &'a dyn BlockWipeOps,
        layout: &'a Layout,
    ) -> Self {
        Self {
            mounts,
            formatter,
            process,
            wiper,
            layout,
        }
    }

    /// Format the volume mounted at exactly `mount_point`.
    ///
    /// `seed_dir`, when given, is copied into the new ext4 filesystem.
    pub fn format(&self, mount_point: &Path, seed_dir: Option<&Path>) -> VolumeResult<()> {
        let volume = self
            .mounts
            .table()
            .volume_for_path(mount_point)
            .ok_or_else(|| {
                log::error!("unknown volume \"{}\"", mount_point.display());
                VolumeError::UnknownVolume(mount_point.to_path_buf())
            })?;

        if volume.mount_point != mount_point {
            log::error!("can't give path \"{}\" to format", mount_point.display());
            return Err(VolumeError::PathMismatch {
                given: mount_point.to_path_buf(),
                canonical: volume.mount_point.clone(),
            });
        }

        if volume.is_ramdisk() {
            log::error!("can't format \"{}\"", mount_point.display());
            return Err(unsupported(volume));
        }

        if let Err(e) = self.mounts.ensure_unmounted(mount_point) {
            log::error!(
                "format failed to unmount \"{}\"",
                volume.mount_point.display()
            );
            return Err(e);
        }

        match volume.fs_type {
            FsType::Ext4 | FsType::F2fs => {
                self.wipe_key_device(volume)?;
                self.build_filesystem(volume, seed_dir)
            }
            _ => {
                log::error!("format: fs_type \"{}\" unsupported", volume.fs_type);
                Err(unsupported(volume))
            }
        }
    }

    fn wipe_key_device(&self, volume: &Volume) -> VolumeResult<()> {
        let Some(key_loc) = volume.key_device() else {
            return Ok(());
        };
        log::info!("wiping {}", key_loc.display());
        self.wiper
            .wipe_block_device(key_loc)
            .map(|_| ())
            .map_err(|source| {
                log::error!("format: failed to wipe {}: {}", key_loc.display(), source);
                VolumeError::KeyWipeFailure {
                    key_loc: key_loc.to_path_buf(),
                    source,
                }
            })
    }

    fn build_filesystem(&self, volume: &Volume, seed_dir: Option<&Path>) -> VolumeResult<()> {
        let length = volume.format_length();
        let result = match volume.fs_type {
            FsType::Ext4 => {
                let req = Ext4Request {
                    device: volume.blk_device.clone(),
                    length,
                    mount_point: volume.mount_point.clone(),
                    security_context: self.layout.security_context.clone(),
                    seed_dir: seed_dir.map(Path::to_path_buf),
                    alignment: volume.alignment(),
                };
                self.formatter.make_ext4(&req)
            }
            _ => {
                let spec =
                    f2fs_command_spec(&self.layout.mkfs_f2fs_program, &volume.blk_device, length);
                self.process.run_spec(&spec)
            }
        };

        result.map_err(|source| {
            log::error!(
                "format: make {} failed on {}: {}",
                volume.fs_type,
                volume.blk_device.display(),
                source
            );
            classify_build_error(volume, source)
        })
    }
}

fn unsupported(volume: &Volume) -> VolumeError {
    VolumeError::UnsupportedFsType {
        mount_point: volume.mount_point.clone(),
        fs_type: volume.fs_type.to_string(),
    }
}

fn classify_build_error(volume: &Volume, source: HalError) -> VolumeError {
    if volume.fs_type == FsType::F2fs && source.is_spawn_failure() {
        return VolumeError::ProcessExecFailure {
            program: "mkfs.f2fs".to_string(),
            source,
        };
    }
    VolumeError::FormatFailure {
        fs_type: volume.fs_type.to_string(),
        device: volume.blk_device.clone(),
        source,
    }
}
