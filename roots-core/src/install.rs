//! Mount layout required before applying an update package.

use crate::config::Layout;
use crate::errors::VolumeResult;
use crate::mounts::MountManager;
use crate::table::{VolumeTable, TMP_ROOT};
use std::path::Path;

/// Mount `/tmp` and the cache, unmount everything else.
///
/// Stops at the first volume that cannot be put in its required state.
pub fn setup_install_mounts(
    table: &VolumeTable,
    mounts: &MountManager<'_>,
    layout: &Layout,
) -> VolumeResult<()> {
    for volume in table.iter() {
        let mount_point = volume.mount_point.as_path();
        let keep_mounted = mount_point == Path::new(TMP_ROOT) || mount_point == layout.cache_root;
        let result = if keep_mounted {
            mounts.ensure_mounted(mount_point)
        } else {
            mounts.ensure_unmounted(mount_point)
        };
        if let Err(e) = result {
            log::error!(
                "Failed to {} {}: {}",
                if keep_mounted { "mount" } else { "unmount" },
                mount_point.display(),
                e
            );
            return Err(e);
        }
    }
    Ok(())
}
