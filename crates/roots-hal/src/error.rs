use thiserror::Error;

pub type HalResult<T> = std::result::Result<T, HalError>;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Device or mount point is busy")]
    DiskBusy,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {program} (exit={code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("nix errno: {0}")]
    Nix(#[from] nix::errno::Errno),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl HalError {
    /// True when the failure happened before the program ran at all.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, HalError::CommandNotFound(_) | HalError::Io(_))
    }
}
