mod common;

use common::*;
use roots_core::{Layout, MountManager, Volume, VolumeError, VolumeFormatter};
use roots_hal::{Alignment, FailPoint, FakeHal, Operation};
use std::path::{Path, PathBuf};

fn format(
    volumes: Vec<Volume>,
    hal: &FakeHal,
    layout: &Layout,
    mount_point: &str,
) -> Result<(), VolumeError> {
    let table = table(volumes);
    let mounts = MountManager::new(&table, hal);
    let formatter = VolumeFormatter::new(&mounts, hal, hal, hal, layout);
    formatter.format(Path::new(mount_point), None)
}

#[test]
fn formatting_tmp_always_fails() {
    let hal = FakeHal::new();
    let err = format(vec![data()], &hal, &Layout::default(), "/tmp").unwrap_err();

    assert!(matches!(err, VolumeError::UnsupportedFsType { .. }));
    assert_eq!(hal.operation_count(), 0);
}

#[test]
fn non_canonical_path_is_rejected() {
    let hal = FakeHal::new();
    let err = format(vec![cache()], &hal, &Layout::default(), "/cache/recovery").unwrap_err();

    assert!(matches!(
        err,
        VolumeError::PathMismatch { given, canonical }
            if given == Path::new("/cache/recovery") && canonical == Path::new("/cache")
    ));
    assert_eq!(hal.operation_count(), 0);
}

#[test]
fn unknown_volume_touches_nothing() {
    let hal = FakeHal::new();
    let err = format(vec![cache()], &hal, &Layout::default(), "/vendor").unwrap_err();

    assert!(matches!(err, VolumeError::UnknownVolume(_)));
    assert_eq!(hal.operation_count(), 0);
}

#[test]
fn mounted_volume_is_unmounted_before_format() {
    let hal = FakeHal::new();
    hal.mark_mounted(CACHE_DEV, "/cache");

    format(vec![cache()], &hal, &Layout::default(), "/cache").unwrap();

    let mutations = hal.mutations();
    let unmount = mutations
        .iter()
        .position(|op| matches!(op, Operation::Unmount { .. }))
        .unwrap();
    let mkfs = mutations
        .iter()
        .position(|op| matches!(op, Operation::MakeExt4 { .. }))
        .unwrap();
    assert!(unmount < mkfs);
}

#[test]
fn ext4_request_carries_footer_reservation_and_alignment() {
    let hal = FakeHal::new();
    let layout = Layout {
        security_context: Some("u:object_r:userdata_file:s0".to_string()),
        ..Layout::default()
    };
    let volume = data().with_key_loc("footer").with_alignment(524288, 4096);

    format(vec![volume], &hal, &layout, "/data").unwrap();

    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::MakeExt4 { device, length, security_context, alignment, seed_dir, .. }
            if device == Path::new(DATA_DEV)
                && *length == -0x4000
                && security_context.as_deref() == Some("u:object_r:userdata_file:s0")
                && *alignment == Some(Alignment { erase_blk_size: 524288, logical_blk_size: 4096 })
                && seed_dir.is_none()
    )));
    assert!(!hal.has_operation(|op| matches!(op, Operation::WipeBlockDevice { .. })));
}

#[test]
fn key_device_is_wiped_before_format() {
    let hal = FakeHal::new();
    let volume = data().with_key_loc(METADATA_DEV);

    format(vec![volume], &hal, &Layout::default(), "/data").unwrap();

    let mutations = hal.mutations();
    assert!(matches!(
        &mutations[0],
        Operation::WipeBlockDevice { path } if path == Path::new(METADATA_DEV)
    ));
    assert!(matches!(&mutations[1], Operation::MakeExt4 { length: 0, .. }));
}

#[test]
fn key_wipe_failure_skips_format() {
    let hal = FakeHal::new();
    hal.fail_on(FailPoint::WipeBlockDevice(PathBuf::from(METADATA_DEV)));
    let volume = data().with_key_loc(METADATA_DEV);

    let err = format(vec![volume], &hal, &Layout::default(), "/data").unwrap_err();

    assert!(matches!(err, VolumeError::KeyWipeFailure { .. }));
    assert!(!formatted(&hal, DATA_DEV));
}

#[test]
fn ext4_failure_is_format_failure() {
    let hal = FakeHal::new();
    hal.fail_on(FailPoint::MakeExt4(PathBuf::from(CACHE_DEV)));

    let err = format(vec![cache()], &hal, &Layout::default(), "/cache").unwrap_err();

    assert!(matches!(err, VolumeError::FormatFailure { fs_type, .. } if fs_type == "ext4"));
}

#[test]
fn f2fs_runs_external_formatter() {
    let hal = FakeHal::new();
    let volume = Volume::new("/data", "f2fs", DATA_DEV).with_key_loc("footer");

    format(vec![volume], &hal, &Layout::default(), "/data").unwrap();

    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::Command { program, args }
            if program == "/sbin/mkfs.f2fs" && args == &["-t1", "-r", "16384", DATA_DEV]
    )));
}

#[test]
fn f2fs_nonzero_exit_is_format_failure() {
    let hal = FakeHal::new();
    hal.set_exit_code("/sbin/mkfs.f2fs", 1);
    let volume = Volume::new("/data", "f2fs", DATA_DEV).with_length(4096);

    let err = format(vec![volume], &hal, &Layout::default(), "/data").unwrap_err();

    assert!(matches!(err, VolumeError::FormatFailure { fs_type, .. } if fs_type == "f2fs"));
}

#[test]
fn f2fs_spawn_failure_is_process_exec_failure() {
    let hal = FakeHal::new();
    hal.fail_on(FailPoint::Spawn("/sbin/mkfs.f2fs".to_string()));
    let volume = Volume::new("/data", "f2fs", DATA_DEV);

    let err = format(vec![volume], &hal, &Layout::default(), "/data").unwrap_err();

    assert!(matches!(err, VolumeError::ProcessExecFailure { .. }));
}

#[test]
fn other_types_are_unsupported() {
    let hal = FakeHal::new();
    let volume = Volume::new("/boot", "emmc", "/dev/block/boot");

    let err = format(vec![volume], &hal, &Layout::default(), "/boot").unwrap_err();

    assert!(matches!(err, VolumeError::UnsupportedFsType { fs_type, .. } if fs_type == "emmc"));
    assert!(hal.mutations().is_empty());
}
