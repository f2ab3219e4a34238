//! Static partition descriptions.

use roots_hal::{Alignment, MountFlag, MountOptions};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Size of the crypto footer reserved at the end of a `key_loc = "footer"` device.
pub const CRYPT_FOOTER_OFFSET: i64 = 0x4000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum FsType {
    Ramdisk,
    Ext4,
    F2fs,
    Vfat,
    Squashfs,
    Other(String),
}

impl FsType {
    pub fn as_str(&self) -> &str {
        match self {
            FsType::Ramdisk => "ramdisk",
            FsType::Ext4 => "ext4",
            FsType::F2fs => "f2fs",
            FsType::Vfat => "vfat",
            FsType::Squashfs => "squashfs",
            FsType::Other(name) => name,
        }
    }

    /// Types `mount(2)` is attempted for.
    pub fn is_mountable(&self) -> bool {
        matches!(self, FsType::Ext4 | FsType::Squashfs | FsType::Vfat)
    }
}

impl From<String> for FsType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "ramdisk" => FsType::Ramdisk,
            "ext4" => FsType::Ext4,
            "f2fs" => FsType::F2fs,
            "vfat" => FsType::Vfat,
            "squashfs" => FsType::Squashfs,
            _ => FsType::Other(raw),
        }
    }
}

impl From<&str> for FsType {
    fn from(raw: &str) -> Self {
        FsType::from(raw.to_string())
    }
}

impl fmt::Display for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a volume keeps its encryption metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum KeyLoc {
    /// A crypto footer at the end of the volume itself.
    Footer,
    /// A separate block device holding the metadata.
    Device(PathBuf),
    /// Anything else; carried but never acted on.
    Other(String),
}

impl From<String> for KeyLoc {
    fn from(raw: String) -> Self {
        if raw == "footer" {
            KeyLoc::Footer
        } else if raw.starts_with('/') {
            KeyLoc::Device(PathBuf::from(raw))
        } else {
            KeyLoc::Other(raw)
        }
    }
}

/// One statically configured partition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Volume {
    pub mount_point: PathBuf,
    pub fs_type: FsType,
    pub blk_device: PathBuf,
    #[serde(default)]
    pub flags: Vec<MountFlag>,
    #[serde(default)]
    pub fs_options: Option<String>,
    /// Negative values reserve that many bytes at the end of the partition.
    #[serde(default)]
    pub length: i64,
    #[serde(default)]
    pub key_loc: Option<KeyLoc>,
    #[serde(default)]
    pub erase_blk_size: Option<u64>,
    #[serde(default)]
    pub logical_blk_size: Option<u64>,
}

impl Volume {
    pub fn new(
        mount_point: impl Into<PathBuf>,
        fs_type: impl Into<FsType>,
        blk_device: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mount_point: mount_point.into(),
            fs_type: fs_type.into(),
            blk_device: blk_device.into(),
            flags: Vec::new(),
            fs_options: None,
            length: 0,
            key_loc: None,
            erase_blk_size: None,
            logical_blk_size: None,
        }
    }

    /// The always-mounted ramdisk entry appended to every table.
    pub fn ramdisk(mount_point: impl Into<PathBuf>) -> Self {
        Self::new(mount_point, FsType::Ramdisk, "ramdisk")
    }

    pub fn with_length(mut self, length: i64) -> Self {
        self.length = length;
        self
    }

    pub fn with_key_loc(mut self, key_loc: impl Into<String>) -> Self {
        self.key_loc = Some(KeyLoc::from(key_loc.into()));
        self
    }

    pub fn with_alignment(mut self, erase_blk_size: u64, logical_blk_size: u64) -> Self {
        self.erase_blk_size = Some(erase_blk_size);
        self.logical_blk_size = Some(logical_blk_size);
        self
    }

    pub fn is_ramdisk(&self) -> bool {
        self.fs_type == FsType::Ramdisk
    }

    pub fn mount_options(&self) -> MountOptions {
        let opts = MountOptions::new().with_flags(&self.flags);
        match &self.fs_options {
            Some(data) => opts.with_data(data.clone()),
            None => opts,
        }
    }

    /// Separate metadata device to zero before formatting, if any.
    pub fn key_device(&self) -> Option<&Path> {
        match &self.key_loc {
            Some(KeyLoc::Device(path)) => Some(path),
            _ => None,
        }
    }

    /// Bytes handed to the formatter: explicit length, then footer reservation, then whole device.
    pub fn format_length(&self) -> i64 {
        if self.length != 0 {
            self.length
        } else if self.key_loc == Some(KeyLoc::Footer) {
            -CRYPT_FOOTER_OFFSET
        } else {
            0
        }
    }

    /// Alignment hints, only when both sizes are known and non-zero.
    pub fn alignment(&self) -> Option<Alignment> {
        match (self.erase_blk_size, self.logical_blk_size) {
            (Some(erase), Some(logical)) if erase != 0 && logical != 0 => Some(Alignment {
                erase_blk_size: erase,
                logical_blk_size: logical,
            }),
            _ => None,
        }
    }
}
