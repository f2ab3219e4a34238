//! Parsing helpers for `/proc/self/mountinfo` (and similar mountinfo files).

use crate::hal::MountRecord;
use std::path::PathBuf;

/// Parse mountinfo content into mount records.
///
/// Lines that do not carry both a mount point and a mount source are skipped.
pub fn parse_mountinfo(content: &str) -> Vec<MountRecord> {
    content
        .lines()
        .filter_map(|line| {
            // mountinfo format:
            //   <pre fields...> <mount point> <...> - <fstype> <source> <superopts>
            let (pre, post) = line.split_once(" - ")?;
            let pre_fields: Vec<&str> = pre.split_whitespace().collect();
            if pre_fields.len() < 5 {
                return None;
            }
            let mut post_fields = post.split_whitespace();
            let _fstype = post_fields.next()?;
            let source = post_fields.next()?;
            Some(MountRecord {
                mount_point: PathBuf::from(unescape_mount_path(pre_fields[4])),
                device: PathBuf::from(unescape_mount_path(source)),
            })
        })
        .collect()
}

pub fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}
