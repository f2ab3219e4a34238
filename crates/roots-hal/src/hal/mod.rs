//! HAL trait definitions and implementations.
//!
//! This module defines the core traits for system operations and provides
//! both real (LinuxHal) and fake (FakeHal) implementations.

pub mod fake_hal;
pub mod format_ops;
pub mod linux_hal;
pub mod mount_ops;
pub mod process_ops;
pub mod wipe_ops;

pub use fake_hal::{FailPoint, FakeHal, Operation};
pub use format_ops::{device_size, ext4_command_spec, Alignment, Ext4Request, FormatOps};
pub use linux_hal::LinuxHal;
pub use mount_ops::{same_mount_path, MountFlag, MountOps, MountOptions, MountRecord};
pub use process_ops::{output_failed, CommandSpec, ProcessOps};
pub use wipe_ops::BlockWipeOps;

/// Complete HAL combining all system operation traits.
pub trait SystemHal: MountOps + FormatOps + ProcessOps + BlockWipeOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: MountOps + FormatOps + ProcessOps + BlockWipeOps + Send + Sync {}
