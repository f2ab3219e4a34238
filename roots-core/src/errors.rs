use roots_hal::HalError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for volume operations
pub type VolumeResult<T> = std::result::Result<T, VolumeError>;

#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("Volume table unavailable: {0}")]
    TableUnavailable(String),

    #[error("unknown volume for path [{}]", .0.display())]
    UnknownVolume(PathBuf),

    #[error("unsupported fs_type \"{fs_type}\" for {}", .mount_point.display())]
    UnsupportedFsType {
        mount_point: PathBuf,
        fs_type: String,
    },

    #[error("can't give path \"{}\" to format (volume is {})", .given.display(), .canonical.display())]
    PathMismatch { given: PathBuf, canonical: PathBuf },

    #[error("Failed to scan mounted volumes: {0}")]
    ScanFailure(#[source] HalError),

    #[error("Failed to mount {}: {source}", .mount_point.display())]
    MountFailure {
        mount_point: PathBuf,
        #[source]
        source: HalError,
    },

    #[error("Failed to unmount {}: {source}", .target.display())]
    UnmountFailure {
        target: PathBuf,
        #[source]
        source: HalError,
    },

    #[error("make {fs_type} failed on {}: {source}", .device.display())]
    FormatFailure {
        fs_type: String,
        device: PathBuf,
        #[source]
        source: HalError,
    },

    #[error("failed to wipe key location {}: {source}", .key_loc.display())]
    KeyWipeFailure {
        key_loc: PathBuf,
        #[source]
        source: HalError,
    },

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("No {} partition found", .0.display())]
    NoCachePartition(PathBuf),

    #[error("{0} hook failed")]
    HookFailure(&'static str),

    #[error("Failed to run {program}: {source}")]
    ProcessExecFailure {
        program: String,
        #[source]
        source: HalError,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
