//! Idempotent ensure-mounted / ensure-unmounted over single volumes.
//!
//! Callers (wipes, install setup) invoke these speculatively without knowing
//! the prior state, so "already in the requested state" is always success.
//! The live mount table is re-scanned on every call.

use crate::errors::{VolumeError, VolumeResult};
use crate::table::VolumeTable;
use crate::volume::Volume;
use roots_hal::{same_mount_path, MountOps, MountRecord};
use std::path::Path;

pub struct MountManager<'a> {
    table: &'a VolumeTable,
    hal: &'a dyn MountOps,
}

impl<'a> MountManager<'a> {
    pub fn new(table: &'a VolumeTable, hal: &'a dyn MountOps) -> Self {
        Self { table, hal }
    }

    pub fn table(&self) -> &'a VolumeTable {
        self.table
    }

    fn resolve(&self, path: &Path) -> VolumeResult<&'a Volume> {
        self.table.volume_for_path(path).ok_or_else(|| {
            log::error!("unknown volume for path [{}]", path.display());
            VolumeError::UnknownVolume(path.to_path_buf())
        })
    }

    fn scan(&self) -> VolumeResult<Vec<MountRecord>> {
        self.hal.scan_mounts().map_err(|e| {
            log::error!("Failed to scan mounted volumes: {}", e);
            VolumeError::ScanFailure(e)
        })
    }

    /// Mount the volume owning `path` at its own mount point.
    pub fn ensure_mounted(&self, path: &Path) -> VolumeResult<()> {
        self.ensure_mounted_at(path, None)
    }

    /// Mount the volume owning `path` at `mount_point`, or at its own mount point.
    ///
    /// Any existing mount at the target counts as success; the backing device
    /// is not compared.
    pub fn ensure_mounted_at(&self, path: &Path, mount_point: Option<&Path>) -> VolumeResult<()> {
        let volume = self.resolve(path)?;
        if volume.is_ramdisk() {
            return Ok(());
        }

        let mounted = self.scan()?;
        let target = mount_point.unwrap_or(volume.mount_point.as_path());
        if mounted
            .iter()
            .any(|r| same_mount_path(&r.mount_point, target))
        {
            log::debug!("{} already mounted", target.display());
            return Ok(());
        }

        if !volume.fs_type.is_mountable() {
            log::error!(
                "unknown fs_type \"{}\" for {}",
                volume.fs_type,
                target.display()
            );
            return Err(VolumeError::UnsupportedFsType {
                mount_point: target.to_path_buf(),
                fs_type: volume.fs_type.to_string(),
            });
        }

        if let Err(e) = self.hal.prepare_mount_point(target) {
            log::warn!("could not create {}: {}", target.display(), e);
        }

        self.hal
            .mount_device(
                &volume.blk_device,
                target,
                volume.fs_type.as_str(),
                &volume.mount_options(),
            )
            .map_err(|source| {
                log::error!("Failed to mount {}: {}", target.display(), source);
                VolumeError::MountFailure {
                    mount_point: target.to_path_buf(),
                    source,
                }
            })
    }

    /// Unmount the volume owning `path`. The ramdisk can never be unmounted.
    pub fn ensure_unmounted(&self, path: &Path) -> VolumeResult<()> {
        let volume = self.resolve(path)?;
        if volume.is_ramdisk() {
            return Err(VolumeError::UnsupportedFsType {
                mount_point: volume.mount_point.clone(),
                fs_type: volume.fs_type.to_string(),
            });
        }

        let mounted = self.scan()?;
        match mounted
            .iter()
            .find(|r| same_mount_path(&r.mount_point, &volume.mount_point))
        {
            None => Ok(()),
            Some(record) => self.unmount_record(record),
        }
    }

    /// Unmount whatever is mounted from `device`, bypassing mount point lookup.
    pub fn ensure_device_unmounted(&self, device: &Path) -> VolumeResult<()> {
        let mounted = self.scan()?;
        mounted
            .iter()
            .filter(|r| r.device == device)
            .try_for_each(|record| self.unmount_record(record))
    }

    fn unmount_record(&self, record: &MountRecord) -> VolumeResult<()> {
        self.hal.unmount(&record.mount_point).map_err(|source| {
            log::error!(
                "Failed to unmount {}: {}",
                record.mount_point.display(),
                source
            );
            VolumeError::UnmountFailure {
                target: record.mount_point.clone(),
                source,
            }
        })
    }
}
