//! ROOTS core library.
//!
//! `roots-core` owns the volume table of a recovery environment and every
//! lifecycle action on it: idempotent mounting, formatting, composite wipes
//! and the install-time mount layout. All OS work goes through the
//! capability traits of `roots-hal`.

pub mod config;
pub mod errors;
pub mod format;
pub mod hooks;
pub mod install;
pub mod logging;
pub mod logs;
pub mod mounts;
pub mod table;
pub mod ui;
pub mod volume;
pub mod wipe;

pub use config::{Layout, RootsConfig};
pub use errors::{VolumeError, VolumeResult};
pub use format::VolumeFormatter;
pub use install::setup_install_mounts;
pub use mounts::MountManager;
pub use table::{ConfigTableSource, TableSource, VolumeTable};
pub use volume::{FsType, KeyLoc, Volume};
pub use wipe::{StepOutcome, WipeOrchestrator, WipeStep};
