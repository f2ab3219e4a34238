//! Zero-filling of encryption side-channel devices.

use crate::HalResult;
use std::path::Path;

pub trait BlockWipeOps {
    /// Overwrite `path` with zeros for its full current size.
    ///
    /// The path is opened for writing and created when missing, matching how
    /// key-metadata partitions are addressed by path. Returns the number of
    /// bytes wiped.
    fn wipe_block_device(&self, path: &Path) -> HalResult<u64>;
}
