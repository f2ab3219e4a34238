//! The process-lifetime volume table.

use crate::errors::{VolumeError, VolumeResult};
use crate::volume::Volume;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Mount point of the synthetic ramdisk entry.
pub const TMP_ROOT: &str = "/tmp";

/// Provider of the static partition list.
pub trait TableSource {
    fn load_volumes(&self) -> anyhow::Result<Vec<Volume>>;
}

impl TableSource for Vec<Volume> {
    fn load_volumes(&self) -> anyhow::Result<Vec<Volume>> {
        Ok(self.clone())
    }
}

/// Reads the `[[volume]]` entries of a ROOTS config file.
#[derive(Debug, Clone)]
pub struct ConfigTableSource {
    path: PathBuf,
}

impl ConfigTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Deserialize)]
struct VolumeEntries {
    #[serde(default)]
    volume: Vec<Volume>,
}

impl TableSource for ConfigTableSource {
    fn load_volumes(&self) -> anyhow::Result<Vec<Volume>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let entries: VolumeEntries = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        if entries.volume.is_empty() {
            anyhow::bail!("{} declares no volumes", self.path.display());
        }
        Ok(entries.volume)
    }
}

/// Immutable, ordered table of known volumes.
#[derive(Debug, Clone)]
pub struct VolumeTable {
    volumes: Vec<Volume>,
}

impl VolumeTable {
    /// Load from `source` and append the synthetic `/tmp` ramdisk entry.
    pub fn load(source: &dyn TableSource) -> VolumeResult<Self> {
        let mut volumes = source
            .load_volumes()
            .map_err(|e| VolumeError::TableUnavailable(format!("{:#}", e)))?;
        volumes.push(Volume::ramdisk(TMP_ROOT));

        let mut seen = HashSet::new();
        for volume in &volumes {
            if !seen.insert(volume.mount_point.clone()) {
                return Err(VolumeError::TableUnavailable(format!(
                    "duplicate mount point {}",
                    volume.mount_point.display()
                )));
            }
        }

        let table = Self { volumes };
        table.log_table();
        Ok(table)
    }

    fn log_table(&self) {
        log::info!("recovery filesystem table");
        log::info!("=========================");
        for line in self.describe() {
            log::info!("{}", line);
        }
    }

    /// One line per volume: index, mount point, fs type, device and length.
    pub fn describe(&self) -> Vec<String> {
        self.volumes
            .iter()
            .enumerate()
            .map(|(i, v)| {
                format!(
                    "  {} {} {} {} {}",
                    i,
                    v.mount_point.display(),
                    v.fs_type,
                    v.blk_device.display(),
                    v.length
                )
            })
            .collect()
    }

    /// Exact lookup by canonical mount point.
    pub fn lookup(&self, mount_point: &Path) -> Option<&Volume> {
        self.volumes
            .iter()
            .find(|v| roots_hal::same_mount_path(&v.mount_point, mount_point))
    }

    /// The volume whose mount point is the longest component-wise prefix of `path`.
    pub fn volume_for_path(&self, path: &Path) -> Option<&Volume> {
        self.volumes
            .iter()
            .filter(|v| path.starts_with(&v.mount_point))
            .max_by_key(|v| v.mount_point.components().count())
    }

    pub fn contains(&self, mount_point: &Path) -> bool {
        self.lookup(mount_point).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Volume> {
        self.volumes.iter()
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Resolve where the system image is mounted on this device.
    ///
    /// An explicit override wins; otherwise `/system` when the table has it,
    /// else `/` (system-as-root layouts).
    pub fn system_root(&self, override_root: Option<&Path>) -> PathBuf {
        if let Some(root) = override_root {
            return root.to_path_buf();
        }
        let system = Path::new("/system");
        if self.contains(system) {
            system.to_path_buf()
        } else {
            PathBuf::from("/")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unreadable;

    impl TableSource for Unreadable {
        fn load_volumes(&self) -> anyhow::Result<Vec<Volume>> {
            anyhow::bail!("fstab missing")
        }
    }

    fn table() -> VolumeTable {
        VolumeTable::load(&vec![
            Volume::new("/", "ext4", "/dev/block/system"),
            Volume::new("/data", "ext4", "/dev/block/userdata"),
            Volume::new("/cache", "ext4", "/dev/block/cache"),
        ])
        .unwrap()
    }

    #[test]
    fn load_appends_tmp_ramdisk() {
        let t = table();
        assert_eq!(t.len(), 4);
        let tmp = t.lookup(Path::new("/tmp")).unwrap();
        assert!(tmp.is_ramdisk());
    }

    #[test]
    fn unreadable_source_is_table_unavailable() {
        let err = VolumeTable::load(&Unreadable).unwrap_err();
        assert!(matches!(err, VolumeError::TableUnavailable(msg) if msg.contains("fstab missing")));
    }

    #[test]
    fn duplicate_mount_points_are_rejected() {
        let err = VolumeTable::load(&vec![Volume::new("/tmp", "ext4", "/dev/block/tmp")])
            .unwrap_err();
        assert!(matches!(err, VolumeError::TableUnavailable(_)));
    }

    #[test]
    fn lookup_is_exact() {
        let t = table();
        assert!(t.lookup(Path::new("/data/media")).is_none());
        assert!(t.lookup(Path::new("/data/")).is_some());
    }

    #[test]
    fn volume_for_path_picks_longest_prefix() {
        let t = table();
        let v = t.volume_for_path(Path::new("/cache/recovery/log")).unwrap();
        assert_eq!(v.mount_point, PathBuf::from("/cache"));
        let v = t.volume_for_path(Path::new("/cachefoo")).unwrap();
        assert_eq!(v.mount_point, PathBuf::from("/"));
    }

    #[test]
    fn system_root_resolution() {
        let t = table();
        assert_eq!(t.system_root(None), PathBuf::from("/"));
        assert_eq!(
            t.system_root(Some(Path::new("/system_root"))),
            PathBuf::from("/system_root")
        );

        let with_system =
            VolumeTable::load(&vec![Volume::new("/system", "ext4", "/dev/block/system")]).unwrap();
        assert_eq!(with_system.system_root(None), PathBuf::from("/system"));
    }

    #[test]
    fn config_source_reads_volume_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.toml");
        std::fs::write(
            &path,
            r#"
[[volume]]
mount_point = "/data"
fs_type = "f2fs"
blk_device = "/dev/block/userdata"
length = -16384
key_loc = "footer"
flags = ["nosuid", "nodev"]

[[volume]]
mount_point = "/cache"
fs_type = "ext4"
blk_device = "/dev/block/cache"
"#,
        )
        .unwrap();

        let volumes = ConfigTableSource::new(&path).load_volumes().unwrap();
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0].fs_type, crate::volume::FsType::F2fs);
        assert_eq!(volumes[0].length, -16384);
        assert_eq!(volumes[0].key_loc, Some(crate::volume::KeyLoc::Footer));
        assert!(volumes[1].flags.is_empty());
    }

    #[test]
    fn config_source_without_volumes_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.toml");
        std::fs::write(&path, "[layout]\n").unwrap();
        assert!(ConfigTableSource::new(&path).load_volumes().is_err());
        assert!(ConfigTableSource::new(dir.path().join("missing.toml"))
            .load_volumes()
            .is_err());
    }
}
