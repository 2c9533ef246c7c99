//! Property-based tests for enumeration filtering and open selection.
//!
//! For arbitrary device lists and filters:
//! - `enumerate` returns exactly the matching valid records, in backend order
//! - `0000:0000` placeholders never appear and are never opened
//! - `open` picks the first record `enumerate` would have returned

mod common;

use common::{reset, with, Script, Scripted};
use hidwire::{DeviceInfo, Hid, HidConfig, HidError};
use proptest::prelude::*;

fn small_id() -> impl Strategy<Value = u16> {
    // A narrow id space makes collisions and null pairs likely.
    prop_oneof![Just(0u16), Just(0x03eb), Just(0x2402), 1u16..4]
}

fn device_info() -> impl Strategy<Value = DeviceInfo> {
    (small_id(), small_id(), 0u8..8, "[A-C]{0,2}").prop_map(|(vid, pid, port, serial)| DeviceInfo {
        vendor_id: vid,
        product_id: pid,
        path: format!("{vid:04x}:{pid:04x}/1/{port}"),
        serial_number: serial,
        ..Default::default()
    })
}

fn hid_over(devices: Vec<DeviceInfo>) -> Hid<Scripted> {
    reset(Script {
        devices,
        ..Default::default()
    });
    Hid::with_backend(HidConfig::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_enumerate_is_ordered_filter(
        devices in prop::collection::vec(device_info(), 0..12),
        vid in small_id(),
        pid in small_id(),
    ) {
        let mut hid = hid_over(devices.clone());
        let found = hid.enumerate(vid, pid).unwrap();

        let expected: Vec<DeviceInfo> = devices
            .into_iter()
            .filter(|d| !(d.vendor_id == 0 && d.product_id == 0))
            .filter(|d| vid == 0 || d.vendor_id == vid)
            .filter(|d| pid == 0 || d.product_id == pid)
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn prop_open_matches_first_enumerated(
        devices in prop::collection::vec(device_info(), 0..12),
        vid in small_id(),
        pid in small_id(),
    ) {
        let mut hid = hid_over(devices);
        let first = hid.enumerate(vid, pid).unwrap().into_iter().next();

        match (hid.open(vid, pid, None), first) {
            (Ok(dev), Some(first)) => prop_assert_eq!(dev.info(), &first),
            (Err(HidError::NotFound(_)), None) => {}
            (other, first) => prop_assert!(false, "open={:?} first={:?}", other, first),
        }
        prop_assert!(with(|s| s.open_calls) <= 1);
    }

    #[test]
    fn prop_init_runs_once_per_context(ops in prop::collection::vec(0u8..4, 1..10)) {
        let mut hid = hid_over(vec![]);
        for op in ops {
            match op {
                0 => { hid.init().unwrap(); }
                1 => { hid.enumerate_all().unwrap(); }
                2 => { hid.service().unwrap(); }
                _ => { let _ = hid.open(0x03eb, 0x2402, None); }
            }
        }
        prop_assert_eq!(with(|s| s.init_calls), 1);
    }
}
