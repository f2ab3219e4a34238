//! User-facing destructive actions: cache, data, system and media-preserving wipes.
//!
//! Entry points report through the [`UiSink`] and return a plain `bool`;
//! the underlying [`VolumeError`] only reaches the log.

use crate::config::Layout;
use crate::errors::{VolumeError, VolumeResult};
use crate::format::VolumeFormatter;
use crate::hooks::DeviceHooks;
use crate::logs::{LogStash, WipeLogBundle};
use crate::mounts::MountManager;
use crate::table::VolumeTable;
use crate::ui::{Background, ProgressType, UiSink};
use roots_hal::{CommandSpec, ProcessOps};
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

/// Optional user confirmation; `false` cancels before anything is touched.
pub type ConfirmFn<'f> = Option<&'f dyn Fn() -> bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeStep {
    PreWipeHook,
    EraseData,
    EraseCache,
    EraseMetadata,
    PostWipeHook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: WipeStep,
    pub ok: bool,
}

/// Overall success of a composite wipe.
pub fn all_succeeded(outcomes: &[StepOutcome]) -> bool {
    outcomes.iter().all(|o| o.ok)
}

/// `find` arguments selecting everything of `kind` under `root` except `exclude`.
pub fn exclude_media_command_spec(
    program: &str,
    root: &Path,
    exclude: &Path,
    kind: &str,
) -> CommandSpec {
    let exclude = exclude.display().to_string();
    CommandSpec::new(program)
        .arg(root.display().to_string())
        .arg("-mindepth")
        .arg("1")
        .arg("-type")
        .arg(kind)
        .arg("!")
        .arg("-path")
        .arg(exclude.clone())
        .arg("!")
        .arg("-path")
        .arg(format!("{}/*", exclude))
        .arg("-delete")
}

fn io_error(path: &Path, source: std::io::Error) -> VolumeError {
    VolumeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Create the breadcrumb directory (mode 0700) and its empty marker file.
///
/// A directory left over from an earlier run is an error. When the marker
/// cannot be written the fresh directory is removed again.
pub fn lay_fbe_breadcrumb(layout: &Layout) -> VolumeResult<()> {
    let dir = &layout.convert_fbe_dir;
    let file = layout.convert_fbe_file();

    std::fs::DirBuilder::new()
        .mode(0o700)
        .create(dir)
        .map_err(|e| io_error(dir, e))?;
    if let Err(e) = std::fs::File::create(&file) {
        let _ = std::fs::remove_dir(dir);
        return Err(io_error(&file, e));
    }
    Ok(())
}

/// Remove the marker file, then the breadcrumb directory.
pub fn clear_fbe_breadcrumb(layout: &Layout) -> VolumeResult<()> {
    let file = layout.convert_fbe_file();
    let file_result = std::fs::remove_file(&file).map_err(|e| io_error(&file, e));
    let dir = &layout.convert_fbe_dir;
    std::fs::remove_dir(dir).map_err(|e| io_error(dir, e))?;
    file_result
}

fn report(err: &VolumeError) {
    log::error!("{}", err);
}

fn confirmed(confirm: ConfirmFn<'_>) -> bool {
    match confirm {
        Some(f) if !f() => {
            report(&VolumeError::UserCancelled);
            false
        }
        _ => true,
    }
}

pub struct WipeOrchestrator<'a> {
    table: &'a VolumeTable,
    mounts: &'a MountManager<'a>,
    formatter: &'a VolumeFormatter<'a>,
    process: &'a dyn ProcessOps,
    hooks: &'a dyn DeviceHooks,
    logs: &'a dyn LogStash,
    ui: &'a dyn UiSink,
    layout: &'a Layout,
}

impl<'a> WipeOrchestrator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        table: &'a VolumeTable,
        mounts: &'a MountManager<'a>,
        formatter: &'a VolumeFormatter<'a>,
        process: &'a dyn ProcessOps,
        hooks: &'a dyn DeviceHooks,
        logs: &'a dyn LogStash,
        ui: &'a dyn UiSink,
        layout: &'a Layout,
    ) -> Self {
        Self {
            table,
            mounts,
            formatter,
            process,
            hooks,
            logs,
            ui,
            layout,
        }
    }

    /// Reformat the cache volume, keeping its recovery logs.
    pub fn wipe_cache(&self, confirm: ConfirmFn<'_>) -> bool {
        let cache = &self.layout.cache_root;
        if !self.table.contains(cache) {
            report(&VolumeError::NoCachePartition(cache.clone()));
            self.ui
                .print(&format!("No {} partition found.", cache.display()));
            return false;
        }
        if !confirmed(confirm) {
            return false;
        }

        self.ui.print("-- Wiping cache...");
        let ok = self.erase_volume(cache, false);
        self.ui
            .print(if ok { "Cache wipe complete." } else { "Cache wipe failed." });
        ok
    }

    /// Factory reset: data, then cache and metadata when present.
    pub fn wipe_data(&self, convert_fbe: bool) -> bool {
        self.ui.print("-- Wiping data...");
        let ok = all_succeeded(&self.wipe_data_steps(convert_fbe));
        self.ui
            .print(if ok { "Data wipe complete." } else { "Data wipe failed." });
        ok
    }

    /// Outcome of every step [`wipe_data`](Self::wipe_data) attempted, in order.
    ///
    /// After a successful pre-wipe hook every erase runs even when an earlier
    /// one failed. The post-wipe hook only runs when everything before it succeeded.
    pub fn wipe_data_steps(&self, convert_fbe: bool) -> Vec<StepOutcome> {
        let pre = self.hooks.pre_wipe_data();
        let mut outcomes = vec![StepOutcome {
            step: WipeStep::PreWipeHook,
            ok: pre,
        }];
        if !pre {
            report(&VolumeError::HookFailure("pre-wipe-data"));
            return outcomes;
        }

        outcomes.push(StepOutcome {
            step: WipeStep::EraseData,
            ok: self.erase_volume(&self.layout.data_root, convert_fbe),
        });
        if self.table.contains(&self.layout.cache_root) {
            outcomes.push(StepOutcome {
                step: WipeStep::EraseCache,
                ok: self.erase_volume(&self.layout.cache_root, false),
            });
        }
        if self.table.contains(&self.layout.metadata_root) {
            outcomes.push(StepOutcome {
                step: WipeStep::EraseMetadata,
                ok: self.erase_volume(&self.layout.metadata_root, false),
            });
        }

        if all_succeeded(&outcomes) {
            let post = self.hooks.post_wipe_data();
            if !post {
                report(&VolumeError::HookFailure("post-wipe-data"));
            }
            outcomes.push(StepOutcome {
                step: WipeStep::PostWipeHook,
                ok: post,
            });
        }
        outcomes
    }

    /// Reformat the system image volume wherever this device keeps it.
    pub fn wipe_system(&self, confirm: ConfirmFn<'_>) -> bool {
        if !confirmed(confirm) {
            return false;
        }

        self.ui.print("-- Wiping system...");
        let root = self
            .table
            .system_root(self.layout.system_root.as_deref());
        let ok = self.erase_volume(&root, false);
        self.ui
            .print(if ok { "System wipe complete." } else { "System wipe failed." });
        ok
    }

    /// Delete everything under the data root except the media subtree, without reformatting.
    pub fn wipe_data_exclude_media(&self, confirm: ConfirmFn<'_>) -> bool {
        if !confirmed(confirm) {
            return false;
        }

        self.ui
            .print("-- Wiping data without internal storage...");
        let ok = self.delete_outside_media();
        self.ui
            .print(if ok { "Data wipe complete." } else { "Data wipe failed." });
        ok
    }

    fn delete_outside_media(&self) -> bool {
        let data = &self.layout.data_root;
        if let Err(e) = self.mounts.ensure_mounted(data) {
            report(&e);
            return false;
        }

        let program = &self.layout.find_program;
        let exclude = &self.layout.media_exclude;
        let files = exclude_media_command_spec(program, data, exclude, "f");
        let ok = match self.process.run_spec(&files) {
            Ok(()) => true,
            Err(source) => {
                report(&VolumeError::ProcessExecFailure {
                    program: program.clone(),
                    source,
                });
                false
            }
        };

        // Non-empty directories make this pass fail; only the file pass counts.
        let dirs = exclude_media_command_spec(program, data, exclude, "d");
        if let Err(e) = self.process.run_spec(&dirs) {
            log::debug!("directory pass over {}: {}", data.display(), e);
        }
        ok
    }

    fn erase_volume(&self, mount_point: &Path, convert_fbe: bool) -> bool {
        let is_cache = mount_point == self.layout.cache_root;
        let is_data = mount_point == self.layout.data_root;

        self.ui.set_background(Background::Erasing);
        self.ui.set_progress_type(ProgressType::Indeterminate);

        let saved = if is_cache {
            Some(self.capture_logs())
        } else {
            None
        };

        self.ui
            .print(&format!("Formatting {}...", mount_point.display()));

        let Some(volume) = self.table.lookup(mount_point) else {
            report(&VolumeError::UnknownVolume(mount_point.to_path_buf()));
            return false;
        };
        if let Err(e) = self.mounts.ensure_device_unmounted(&volume.blk_device) {
            log::error!("Failed to unmount volume!");
            report(&e);
            return false;
        }

        let result = if is_data && convert_fbe {
            match self.format_with_fbe_breadcrumb(mount_point) {
                Some(result) => result,
                None => return false,
            }
        } else {
            self.formatter.format(mount_point, None)
        };

        if let Some(saved) = saved {
            self.restore_logs(&saved);
        }

        match result {
            Ok(()) => true,
            Err(e) => {
                report(&e);
                false
            }
        }
    }

    /// `None` when the breadcrumb could not be laid down and nothing was formatted.
    fn format_with_fbe_breadcrumb(&self, mount_point: &Path) -> Option<VolumeResult<()>> {
        if let Err(e) = lay_fbe_breadcrumb(self.layout) {
            report(&e);
            return None;
        }
        let result = self
            .formatter
            .format(mount_point, Some(&self.layout.convert_fbe_dir));
        if let Err(e) = clear_fbe_breadcrumb(self.layout) {
            log::warn!("{}", e);
        }
        Some(result)
    }

    fn capture_logs(&self) -> WipeLogBundle {
        if let Err(e) = self.mounts.ensure_mounted(&self.layout.cache_root) {
            log::error!("can't read logs before wipe: {}", e);
            return WipeLogBundle::default();
        }
        self.logs.capture()
    }

    fn restore_logs(&self, saved: &WipeLogBundle) {
        if saved.is_empty() {
            return;
        }
        if let Err(e) = self.mounts.ensure_mounted(&self.layout.cache_root) {
            log::error!("can't restore logs after wipe: {}", e);
            return;
        }
        self.logs.restore(saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_exclusion_arguments() {
        let spec = exclude_media_command_spec(
            "/system/bin/find",
            Path::new("/data"),
            Path::new("/data/media"),
            "f",
        );
        assert_eq!(
            spec.arg_refs(),
            vec![
                "/data",
                "-mindepth",
                "1",
                "-type",
                "f",
                "!",
                "-path",
                "/data/media",
                "!",
                "-path",
                "/data/media/*",
                "-delete"
            ]
        );
    }

    fn scratch_layout(dir: &Path) -> Layout {
        Layout {
            convert_fbe_dir: dir.join("convert_fbe"),
            ..Layout::default()
        }
    }

    #[test]
    fn breadcrumb_round_trip_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = scratch_layout(dir.path());

        lay_fbe_breadcrumb(&layout).unwrap();
        assert!(layout.convert_fbe_file().is_file());
        clear_fbe_breadcrumb(&layout).unwrap();

        assert!(!layout.convert_fbe_dir.exists());
    }

    #[test]
    fn stale_breadcrumb_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = scratch_layout(dir.path());
        std::fs::create_dir(&layout.convert_fbe_dir).unwrap();

        let err = lay_fbe_breadcrumb(&layout).unwrap_err();

        assert!(matches!(
            err,
            VolumeError::Io { path, source }
                if path == layout.convert_fbe_dir
                    && source.kind() == std::io::ErrorKind::AlreadyExists
        ));
    }

    #[test]
    fn clearing_a_missing_breadcrumb_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let layout = scratch_layout(dir.path());

        let err = clear_fbe_breadcrumb(&layout).unwrap_err();

        assert!(matches!(err, VolumeError::Io { path, .. } if path == layout.convert_fbe_dir));
    }

    #[test]
    fn composite_result_is_conjunction() {
        let ok = |step| StepOutcome { step, ok: true };
        let mut outcomes = vec![ok(WipeStep::PreWipeHook), ok(WipeStep::EraseData)];
        assert!(all_succeeded(&outcomes));
        outcomes.push(StepOutcome {
            step: WipeStep::EraseCache,
            ok: false,
        });
        outcomes.push(ok(WipeStep::EraseMetadata));
        assert!(!all_succeeded(&outcomes));
    }
}
