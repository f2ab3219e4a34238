//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them,
//! allowing for CI-safe testing without root privileges or real hardware.

use super::{
    Alignment, BlockWipeOps, Ext4Request, FormatOps, MountOps, MountOptions, MountRecord,
    ProcessOps,
};
use crate::{HalError, HalResult};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex, MutexGuard};

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ScanMounts,
    PrepareMountPoint {
        target: PathBuf,
    },
    Mount {
        device: PathBuf,
        target: PathBuf,
        fstype: String,
        options: MountOptions,
    },
    Unmount {
        target: PathBuf,
    },
    MakeExt4 {
        device: PathBuf,
        length: i64,
        mount_point: PathBuf,
        security_context: Option<String>,
        seed_dir: Option<PathBuf>,
        /// Whether the seed directory existed when the formatter ran.
        seed_present: bool,
        alignment: Option<Alignment>,
    },
    WipeBlockDevice {
        path: PathBuf,
    },
    Command {
        program: String,
        args: Vec<String>,
    },
}

impl Operation {
    /// True for operations that change device or mount state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::ScanMounts)
    }
}

/// Injected failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Scan,
    Mount(PathBuf),
    Unmount(PathBuf),
    MakeExt4(PathBuf),
    WipeBlockDevice(PathBuf),
    /// The named program cannot be spawned at all.
    Spawn(String),
}

/// Shared state for FakeHal operations.
#[derive(Debug, Default)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    /// Currently mounted paths and their backing devices
    mounted: BTreeMap<PathBuf, PathBuf>,
    failures: HashSet<FailPoint>,
    exit_codes: HashMap<String, i32>,
    /// Directories whose contents disappear when their device is formatted
    erase_on_format: HashMap<PathBuf, PathBuf>,
}

/// Fake HAL implementation that records operations without executing them.
///
/// This is designed for testing and CI environments where real system
/// operations would fail or be dangerous.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeHalState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    /// Recorded operations that change device or mount state.
    pub fn mutations(&self) -> Vec<Operation> {
        self.operations()
            .into_iter()
            .filter(Operation::is_mutation)
            .collect()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.lock().operations.len()
    }

    /// Count the operations matching `check`.
    pub fn count(&self, check: impl Fn(&Operation) -> bool) -> usize {
        self.lock().operations.iter().filter(|op| check(op)).count()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.lock().operations.iter().any(check)
    }

    /// Clear recorded operations. Mount state and injected behaviour are kept.
    pub fn clear(&self) {
        self.lock().operations.clear();
    }

    /// Pretend `device` is already mounted at `target`.
    pub fn mark_mounted(&self, device: impl Into<PathBuf>, target: impl Into<PathBuf>) {
        self.lock().mounted.insert(target.into(), device.into());
    }

    pub fn is_mounted(&self, target: &Path) -> bool {
        self.lock().mounted.contains_key(target)
    }

    pub fn fail_on(&self, point: FailPoint) {
        self.lock().failures.insert(point);
    }

    /// Make every run of `program` exit with `code`.
    pub fn set_exit_code(&self, program: impl Into<String>, code: i32) {
        self.lock().exit_codes.insert(program.into(), code);
    }

    /// Empty `dir` whenever `device` is formatted, to model data loss.
    pub fn erase_on_format(&self, device: impl Into<PathBuf>, dir: impl Into<PathBuf>) {
        self.lock()
            .erase_on_format
            .insert(device.into(), dir.into());
    }

    fn record_operation(&self, op: Operation) {
        self.lock().operations.push(op);
    }

    fn should_fail(&self, point: &FailPoint) -> bool {
        self.lock().failures.contains(point)
    }

    fn simulate_erase(&self, device: &Path) -> HalResult<()> {
        let dir = self.lock().erase_on_format.get(device).cloned();
        if let Some(dir) = dir {
            if dir.is_dir() {
                for entry in std::fs::read_dir(&dir)? {
                    let path = entry?.path();
                    if path.is_dir() {
                        std::fs::remove_dir_all(&path)?;
                    } else {
                        std::fs::remove_file(&path)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl MountOps for FakeHal {
    fn prepare_mount_point(&self, target: &Path) -> HalResult<()> {
        self.record_operation(Operation::PrepareMountPoint {
            target: target.to_path_buf(),
        });
        Ok(())
    }

    fn mount_device(
        &self,
        device: &Path,
        target: &Path,
        fstype: &str,
        options: &MountOptions,
    ) -> HalResult<()> {
        log::info!(
            "FAKE HAL: mount {} -> {} (type: {})",
            device.display(),
            target.display(),
            fstype
        );

        self.record_operation(Operation::Mount {
            device: device.to_path_buf(),
            target: target.to_path_buf(),
            fstype: fstype.to_string(),
            options: options.clone(),
        });
        if self.should_fail(&FailPoint::Mount(target.to_path_buf())) {
            return Err(HalError::Nix(nix::errno::Errno::EINVAL));
        }
        self.mark_mounted(device, target);

        Ok(())
    }

    fn unmount(&self, target: &Path) -> HalResult<()> {
        log::info!("FAKE HAL: unmount {}", target.display());

        self.record_operation(Operation::Unmount {
            target: target.to_path_buf(),
        });
        if self.should_fail(&FailPoint::Unmount(target.to_path_buf())) {
            return Err(HalError::DiskBusy);
        }
        self.lock().mounted.remove(target);

        Ok(())
    }

    fn scan_mounts(&self) -> HalResult<Vec<MountRecord>> {
        self.record_operation(Operation::ScanMounts);
        if self.should_fail(&FailPoint::Scan) {
            return Err(HalError::Other("mount table unavailable".to_string()));
        }
        Ok(self
            .lock()
            .mounted
            .iter()
            .map(|(mount_point, device)| MountRecord {
                mount_point: mount_point.clone(),
                device: device.clone(),
            })
            .collect())
    }
}

impl FormatOps for FakeHal {
    fn make_ext4(&self, req: &Ext4Request) -> HalResult<()> {
        log::info!(
            "FAKE HAL: make ext4 {} ({} bytes)",
            req.device.display(),
            req.length
        );

        self.record_operation(Operation::MakeExt4 {
            device: req.device.clone(),
            length: req.length,
            mount_point: req.mount_point.clone(),
            security_context: req.security_context.clone(),
            seed_dir: req.seed_dir.clone(),
            seed_present: req.seed_dir.as_ref().is_some_and(|p| p.exists()),
            alignment: req.alignment,
        });
        if self.should_fail(&FailPoint::MakeExt4(req.device.clone())) {
            return Err(HalError::CommandFailed {
                program: "mke2fs".to_string(),
                code: Some(1),
                stderr: "injected failure".to_string(),
            });
        }
        self.simulate_erase(&req.device)
    }
}

impl ProcessOps for FakeHal {
    fn command_output(&self, program: &str, args: &[&str]) -> HalResult<Output> {
        log::info!("FAKE HAL: exec {} {}", program, args.join(" "));

        if self.should_fail(&FailPoint::Spawn(program.to_string())) {
            return Err(HalError::CommandNotFound(program.to_string()));
        }
        self.record_operation(Operation::Command {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        });

        let code = self.lock().exit_codes.get(program).copied().unwrap_or(0);
        if code == 0 {
            // mkfs.f2fs style formatters: erase the device named in the args.
            for arg in args {
                self.simulate_erase(Path::new(arg))?;
            }
        }

        Ok(Output {
            // Exit codes live in the high byte of a wait status.
            status: ExitStatus::from_raw(code << 8),
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}

impl BlockWipeOps for FakeHal {
    fn wipe_block_device(&self, path: &Path) -> HalResult<u64> {
        log::info!("FAKE HAL: wipe {}", path.display());

        self.record_operation(Operation::WipeBlockDevice {
            path: path.to_path_buf(),
        });
        if self.should_fail(&FailPoint::WipeBlockDevice(path.to_path_buf())) {
            return Err(HalError::PermissionDenied);
        }
        Ok(0)
    }
}
