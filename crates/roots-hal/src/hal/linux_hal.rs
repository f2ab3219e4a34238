//! Linux HAL implementation using real system calls.

use super::format_ops::{device_size, ext4_command_spec};
use super::{
    BlockWipeOps, Ext4Request, FormatOps, MountFlag, MountOps, MountOptions, MountRecord,
    ProcessOps,
};
use crate::{HalError, HalResult};
use nix::mount::{MntFlags, MsFlags};
use std::fs;
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const MOUNTINFO_PATH: &str = "/proc/self/mountinfo";
const DEFAULT_MKE2FS: &str = "mke2fs";
const WIPE_CHUNK: usize = 1024 * 1024;

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone)]
pub struct LinuxHal {
    mke2fs: String,
}

impl Default for LinuxHal {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxHal {
    pub fn new() -> Self {
        Self {
            mke2fs: DEFAULT_MKE2FS.to_string(),
        }
    }

    /// Use a specific ext4 builder binary instead of `mke2fs` from `PATH`.
    pub fn with_mke2fs(mut self, program: impl Into<String>) -> Self {
        self.mke2fs = program.into();
        self
    }
}

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

fn map_nix_err(err: nix::errno::Errno) -> HalError {
    use nix::errno::Errno;
    match err {
        Errno::EBUSY => HalError::DiskBusy,
        Errno::EACCES | Errno::EPERM => HalError::PermissionDenied,
        other => HalError::Nix(other),
    }
}

fn ms_flags(flags: &[MountFlag]) -> MsFlags {
    flags.iter().fold(MsFlags::empty(), |acc, flag| {
        acc | match flag {
            MountFlag::ReadOnly => MsFlags::MS_RDONLY,
            MountFlag::NoSuid => MsFlags::MS_NOSUID,
            MountFlag::NoDev => MsFlags::MS_NODEV,
            MountFlag::NoExec => MsFlags::MS_NOEXEC,
            MountFlag::NoAtime => MsFlags::MS_NOATIME,
            MountFlag::NoDirAtime => MsFlags::MS_NODIRATIME,
            MountFlag::Synchronous => MsFlags::MS_SYNCHRONOUS,
            MountFlag::RelAtime => MsFlags::MS_RELATIME,
        }
    })
}

impl MountOps for LinuxHal {
    fn prepare_mount_point(&self, target: &Path) -> HalResult<()> {
        match fs::DirBuilder::new().mode(0o755).create(target) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(err) => Err(HalError::Io(err)),
        }
    }

    fn mount_device(
        &self,
        device: &Path,
        target: &Path,
        fstype: &str,
        options: &MountOptions,
    ) -> HalResult<()> {
        log::info!(
            "mount {} -> {} (type: {})",
            device.display(),
            target.display(),
            fstype
        );

        let flags = ms_flags(&options.flags);
        let data = options.data.as_deref();
        nix::mount::mount(Some(device), target, Some(fstype), flags, data).map_err(map_nix_err)?;

        Ok(())
    }

    fn unmount(&self, target: &Path) -> HalResult<()> {
        log::info!("unmount {}", target.display());
        nix::mount::umount2(target, MntFlags::empty()).map_err(map_nix_err)?;
        Ok(())
    }

    fn scan_mounts(&self) -> HalResult<Vec<MountRecord>> {
        let content = fs::read_to_string(MOUNTINFO_PATH)?;
        Ok(crate::procfs::mountinfo::parse_mountinfo(&content))
    }
}

impl FormatOps for LinuxHal {
    /// Runs `mke2fs`. It has no SELinux labelling of its own, so the
    /// security context is only logged; files are relabelled on next boot.
    fn make_ext4(&self, req: &Ext4Request) -> HalResult<()> {
        let total = if req.length < 0 {
            Some(device_size(&req.device)?)
        } else {
            None
        };
        let spec = ext4_command_spec(&self.mke2fs, req, total);

        log::info!(
            "making ext4 on {} for {} (context: {:?})",
            req.device.display(),
            req.mount_point.display(),
            req.security_context
        );
        self.run_spec(&spec)
    }
}

impl ProcessOps for LinuxHal {
    fn command_output(&self, program: &str, args: &[&str]) -> HalResult<Output> {
        log::info!("exec {} {}", program, args.join(" "));
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| map_command_err(program, e))
    }
}

impl BlockWipeOps for LinuxHal {
    fn wipe_block_device(&self, path: &Path) -> HalResult<u64> {
        let mut out = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let size = out.seek(SeekFrom::End(0))?;
        out.seek(SeekFrom::Start(0))?;

        let zeros = vec![0u8; WIPE_CHUNK];
        let mut remaining = size;
        while remaining > 0 {
            let n = remaining.min(WIPE_CHUNK as u64) as usize;
            out.write_all(&zeros[..n])?;
            remaining -= n as u64;
        }

        // Best-effort flush (block devices may ignore).
        out.sync_all().ok();

        log::info!("wiped {} bytes of {}", size, path.display());
        Ok(size)
    }
}
