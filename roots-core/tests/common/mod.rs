#![allow(dead_code)]

use roots_core::hooks::DeviceHooks;
use roots_core::logs::RecoveryLogStash;
use roots_core::ui::MemoryUi;
use roots_core::{Layout, MountManager, Volume, VolumeFormatter, VolumeTable, WipeOrchestrator};
use roots_hal::{FakeHal, ProcessOps};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const DATA_DEV: &str = "/dev/block/userdata";
pub const CACHE_DEV: &str = "/dev/block/cache";
pub const METADATA_DEV: &str = "/dev/block/metadata";
pub const SYSTEM_DEV: &str = "/dev/block/system";

pub fn data() -> Volume {
    Volume::new("/data", "ext4", DATA_DEV)
}

pub fn cache() -> Volume {
    Volume::new("/cache", "ext4", CACHE_DEV)
}

pub fn metadata() -> Volume {
    Volume::new("/metadata", "ext4", METADATA_DEV)
}

pub fn system() -> Volume {
    Volume::new("/system", "ext4", SYSTEM_DEV)
}

pub fn table(volumes: Vec<Volume>) -> VolumeTable {
    VolumeTable::load(&volumes).expect("table loads")
}

/// Device hooks with scripted results that remember whether they ran.
#[derive(Debug)]
pub struct ScriptedHooks {
    pub pre: bool,
    pub post: bool,
    pub pre_called: Cell<bool>,
    pub post_called: Cell<bool>,
}

impl ScriptedHooks {
    pub fn new(pre: bool, post: bool) -> Self {
        Self {
            pre,
            post,
            pre_called: Cell::new(false),
            post_called: Cell::new(false),
        }
    }
}

impl DeviceHooks for ScriptedHooks {
    fn pre_wipe_data(&self) -> bool {
        self.pre_called.set(true);
        self.pre
    }

    fn post_wipe_data(&self) -> bool {
        self.post_called.set(true);
        self.post
    }
}

/// A recovery environment backed by `FakeHal` and a scratch directory.
///
/// The cache's contents live under `<scratch>/cache` and vanish when the
/// cache device is formatted.
pub struct Fixture {
    pub dir: TempDir,
    pub table: VolumeTable,
    pub hal: FakeHal,
    pub layout: Layout,
    pub ui: MemoryUi,
    pub hooks: ScriptedHooks,
    pub stash: RecoveryLogStash,
}

impl Fixture {
    pub fn new(volumes: Vec<Volume>) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache_dir = dir.path().join("cache");
        std::fs::create_dir_all(cache_dir.join("recovery")).expect("cache dir");

        let layout = Layout {
            convert_fbe_dir: dir.path().join("convert_fbe"),
            ..Layout::default()
        };
        let hal = FakeHal::new();
        hal.erase_on_format(CACHE_DEV, &cache_dir);

        Self {
            stash: RecoveryLogStash::new(cache_dir.join("recovery")),
            table: table(volumes),
            hal,
            layout,
            ui: MemoryUi::new(),
            hooks: ScriptedHooks::new(true, true),
            dir,
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.cache_dir().join("recovery")
    }

    pub fn run<R>(&self, f: impl FnOnce(&WipeOrchestrator<'_>) -> R) -> R {
        self.run_with_process(&self.hal, f)
    }

    /// Like [`run`](Self::run) but with child processes going to `process`.
    pub fn run_with_process<R>(
        &self,
        process: &dyn ProcessOps,
        f: impl FnOnce(&WipeOrchestrator<'_>) -> R,
    ) -> R {
        let mounts = MountManager::new(&self.table, &self.hal);
        let formatter = VolumeFormatter::new(&mounts, &self.hal, process, &self.hal, &self.layout);
        let orchestrator = WipeOrchestrator::new(
            &self.table,
            &mounts,
            &formatter,
            process,
            &self.hooks,
            &self.stash,
            &self.ui,
            &self.layout,
        );
        f(&orchestrator)
    }
}

pub fn formatted(hal: &FakeHal, device: &str) -> bool {
    hal.has_operation(|op| {
        matches!(op, roots_hal::Operation::MakeExt4 { device: d, .. } if d == Path::new(device))
    })
}
