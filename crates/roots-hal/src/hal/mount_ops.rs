//! Mount operations trait.

use crate::HalResult;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Trait for mounting, unmounting and scanning live mounts.
pub trait MountOps {
    /// Create the mount point directory if it does not exist yet.
    ///
    /// Implementations must treat an existing directory as success.
    fn prepare_mount_point(&self, target: &Path) -> HalResult<()>;

    /// Mount a device to a target path.
    ///
    /// # Arguments
    /// * `device` - Block device path (e.g., `/dev/block/by-name/cache`)
    /// * `target` - Mount point path
    /// * `fstype` - Filesystem type (e.g., `"ext4"`, `"vfat"`)
    /// * `options` - Mount flags and filesystem-specific data
    fn mount_device(
        &self,
        device: &Path,
        target: &Path,
        fstype: &str,
        options: &MountOptions,
    ) -> HalResult<()>;

    /// Unmount a filesystem by mount point.
    fn unmount(&self, target: &Path) -> HalResult<()>;

    /// Read the live mount table. Never cached: every call re-reads.
    fn scan_mounts(&self) -> HalResult<Vec<MountRecord>>;
}

/// One entry of the live mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub mount_point: PathBuf,
    pub device: PathBuf,
}

/// Generic mount flags understood by the kernel's `mount(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountFlag {
    #[serde(alias = "ro")]
    ReadOnly,
    NoSuid,
    NoDev,
    NoExec,
    NoAtime,
    NoDirAtime,
    #[serde(alias = "sync")]
    Synchronous,
    RelAtime,
}

/// Mount options and flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountOptions {
    pub flags: Vec<MountFlag>,
    /// Filesystem-specific option string passed as mount data (e.g. "discard,errors=panic")
    pub data: Option<String>,
}

impl MountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(mut self, flags: &[MountFlag]) -> Self {
        self.flags = flags.to_vec();
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// Normalized comparison used by every scanner consumer: trailing slashes are ignored.
pub fn same_mount_path(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Flags {
        flags: Vec<MountFlag>,
    }

    #[test]
    fn mount_flags_accept_short_aliases() {
        let parsed: Flags =
            toml::from_str(r#"flags = ["ro", "nosuid", "sync", "noatime"]"#).unwrap();
        assert_eq!(
            parsed.flags,
            vec![
                MountFlag::ReadOnly,
                MountFlag::NoSuid,
                MountFlag::Synchronous,
                MountFlag::NoAtime
            ]
        );
    }

    #[test]
    fn same_mount_path_ignores_trailing_slash() {
        assert!(same_mount_path(Path::new("/cache/"), Path::new("/cache")));
        assert!(!same_mount_path(Path::new("/cache"), Path::new("/cache/recovery")));
    }
}
