//! Preserving recovery logs across a cache reformat.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One captured log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedLog {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

/// Everything captured before a wipe, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WipeLogBundle(pub Vec<SavedLog>);

impl WipeLogBundle {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub trait LogStash {
    /// Snapshot the logs into memory. Unreadable files are skipped.
    fn capture(&self) -> WipeLogBundle;

    /// Write a snapshot back. Failures are logged, never fatal.
    fn restore(&self, bundle: &WipeLogBundle);
}

/// Keeps the current `log` and every `last_*` file of a log directory.
#[derive(Debug, Clone)]
pub struct RecoveryLogStash {
    log_dir: PathBuf,
}

impl RecoveryLogStash {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn is_kept(name: &str) -> bool {
        name == "log" || name.starts_with("last_")
    }
}

impl LogStash for RecoveryLogStash {
    fn capture(&self) -> WipeLogBundle {
        if !self.log_dir.is_dir() {
            return WipeLogBundle::default();
        }

        let mut saved = Vec::new();
        for entry in WalkDir::new(&self.log_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let kept = entry.file_name().to_str().is_some_and(Self::is_kept);
            if !kept {
                continue;
            }
            match std::fs::read(entry.path()) {
                Ok(data) => saved.push(SavedLog {
                    path: entry.path().to_path_buf(),
                    data,
                }),
                Err(e) => log::warn!("failed to read {}: {}", entry.path().display(), e),
            }
        }
        log::info!(
            "captured {} log file(s) from {}",
            saved.len(),
            self.log_dir.display()
        );
        WipeLogBundle(saved)
    }

    fn restore(&self, bundle: &WipeLogBundle) {
        if bundle.is_empty() {
            return;
        }
        if let Err(e) = std::fs::create_dir_all(&self.log_dir) {
            log::error!("can't create {}: {}", self.log_dir.display(), e);
            return;
        }
        for log in &bundle.0 {
            if let Err(e) = std::fs::write(&log.path, &log.data) {
                log::error!("failed to restore {}: {}", log.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_keeps_log_and_last_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("log"), b"current").unwrap();
        std::fs::write(dir.path().join("last_log"), b"previous").unwrap();
        std::fs::write(dir.path().join("last_install"), b"ok").unwrap();
        std::fs::write(dir.path().join("command"), b"--wipe_data").unwrap();
        std::fs::create_dir(dir.path().join("last_dir")).unwrap();

        let bundle = RecoveryLogStash::new(dir.path()).capture();

        let names: Vec<_> = bundle
            .0
            .iter()
            .map(|l| l.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["last_install", "last_log", "log"]);
    }

    #[test]
    fn capture_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = RecoveryLogStash::new(dir.path().join("recovery")).capture();
        assert!(bundle.is_empty());
    }

    #[test]
    fn restore_recreates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("recovery");
        std::fs::create_dir(&log_dir).unwrap();
        std::fs::write(log_dir.join("log"), b"\x00binary\xff").unwrap();
        let stash = RecoveryLogStash::new(&log_dir);
        let bundle = stash.capture();

        std::fs::remove_dir_all(&log_dir).unwrap();
        stash.restore(&bundle);

        assert_eq!(std::fs::read(log_dir.join("log")).unwrap(), b"\x00binary\xff");
    }
}
