//! ROOTS hardware abstraction layer.
//!
//! Every world-touching primitive the recovery volume manager needs (mounting,
//! mount-table scans, filesystem construction, side-channel wipes and external
//! processes) sits behind a narrow trait here. [`LinuxHal`] issues the real
//! syscalls; [`FakeHal`] records operations so orchestration logic can be
//! exercised without root or real block devices.

mod error;
pub mod hal;
pub mod procfs;

pub use error::{HalError, HalResult};
pub use hal::*;
