//! Filesystem formatting operations trait.

use super::process_ops::CommandSpec;
use crate::HalResult;
use std::path::{Path, PathBuf};

/// ext4 block size used for stride calculations.
const EXT4_BLOCK_SIZE: u64 = 4096;

/// Trait for building fresh filesystems on block devices.
///
/// Backends may defer SELinux labelling. [`LinuxHal`](super::LinuxHal) runs
/// plain `mke2fs`, which has no labelling option, so it only logs
/// [`Ext4Request::security_context`] and the new files are relabelled on the
/// next boot.
pub trait FormatOps {
    /// Build an ext4 filesystem as described by `req`.
    fn make_ext4(&self, req: &Ext4Request) -> HalResult<()>;
}

/// Flash geometry hints used to align ext4 allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    pub erase_blk_size: u64,
    pub logical_blk_size: u64,
}

/// Everything the ext4 formatter needs for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ext4Request {
    pub device: PathBuf,
    /// Filesystem size in bytes. Zero means the whole device; a negative value
    /// reserves that many bytes at the end of the device.
    pub length: i64,
    /// Mount point the filesystem is built for.
    pub mount_point: PathBuf,
    /// SELinux context for the new files. Not every backend applies it.
    pub security_context: Option<String>,
    /// Directory whose contents are copied into the new filesystem.
    pub seed_dir: Option<PathBuf>,
    pub alignment: Option<Alignment>,
}

impl Ext4Request {
    pub fn new(device: impl Into<PathBuf>, mount_point: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            length: 0,
            mount_point: mount_point.into(),
            security_context: None,
            seed_dir: None,
            alignment: None,
        }
    }
}

/// Build the `mke2fs` invocation for `req`.
///
/// `device_size` is only consulted for negative lengths; without it the
/// reservation cannot be expressed and the whole device is used.
pub fn ext4_command_spec(
    program: &str,
    req: &Ext4Request,
    device_size: Option<u64>,
) -> CommandSpec {
    let mut spec = CommandSpec::new(program)
        .arg("-F")
        .arg("-q")
        .arg("-t")
        .arg("ext4");

    if let Some(seed) = &req.seed_dir {
        spec = spec.arg("-d").arg(seed.display().to_string());
    }

    if let Some(align) = req.alignment {
        let stride = (align.logical_blk_size / EXT4_BLOCK_SIZE).max(1);
        let stripe_width = (align.erase_blk_size / EXT4_BLOCK_SIZE).max(1);
        spec = spec
            .arg("-E")
            .arg(format!("stride={},stripe_width={}", stride, stripe_width));
    }

    spec = spec.arg(req.device.display().to_string());

    let size_bytes = match req.length {
        0 => None,
        len if len > 0 => Some(len as u64),
        len => device_size.map(|total| total.saturating_sub(len.unsigned_abs())),
    };
    if let Some(bytes) = size_bytes {
        spec = spec.arg(format!("{}k", bytes / 1024));
    }

    spec
}

/// Size of a file or block device, measured by seeking to its end.
pub fn device_size(path: &Path) -> HalResult<u64> {
    use std::io::{Seek, SeekFrom};
    let mut file = std::fs::File::open(path)?;
    Ok(file.seek(SeekFrom::End(0))?)
}
