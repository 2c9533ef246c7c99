//! Identity/path encoders.
//!
//! Each backend derives the `DeviceInfo::path` key from different native facts. The
//! formats are fixed; existing callers persist these strings, so they must not drift.
//! Windows paths are the OS interface path used verbatim and need no encoder.

use std::fmt::Write;

/// libusb topology path: `vvvv:pppp/bus/port0/port1/...`.
///
/// Ids are lower-case, zero-padded hex; bus and ports are decimal, ports in
/// root-to-leaf order.
pub fn usb_topology_path(vendor_id: u16, product_id: u16, bus: u8, ports: &[u8]) -> String {
    let mut out = format!("{vendor_id:04x}:{product_id:04x}/{bus}");
    for port in ports {
        // Writing to a String cannot fail.
        let _ = write!(out, "/{port}");
    }
    out
}

/// IOKit property path: `Transport_vvvv_pppp_llllllll`.
///
/// Returns an empty string when the transport property is missing; such devices can
/// still be enumerated but never match an open-by-path.
pub fn hid_manager_path(
    transport: &str,
    vendor_id: u16,
    product_id: u16,
    location_id: u32,
) -> String {
    if transport.is_empty() {
        return String::new();
    }
    format!("{transport}_{vendor_id:04x}_{product_id:04x}_{location_id:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_path_pads_ids_and_lists_ports() {
        assert_eq!(usb_topology_path(0x3eb, 0x2402, 1, &[4]), "03eb:2402/1/4");
        assert_eq!(
            usb_topology_path(0x046d, 0xC52B, 3, &[2, 1, 14]),
            "046d:c52b/3/2/1/14"
        );
    }

    #[test]
    fn topology_path_without_ports_stops_at_bus() {
        assert_eq!(usb_topology_path(0x1d6b, 0x0002, 2, &[]), "1d6b:0002/2");
    }

    #[test]
    fn manager_path_format() {
        assert_eq!(
            hid_manager_path("USB", 0x3eb, 0x2402, 0x1412_0000),
            "USB_03eb_2402_14120000"
        );
        assert_eq!(
            hid_manager_path("Bluetooth", 0x05ac, 0x0265, 0x5a),
            "Bluetooth_05ac_0265_0000005a"
        );
    }

    #[test]
    fn manager_path_prints_location_unsigned() {
        // IOKit hands location ids out as signed 32-bit numbers.
        let location = -1i32 as u32;
        assert_eq!(hid_manager_path("USB", 1, 2, location), "USB_0001_0002_ffffffff");
    }

    #[test]
    fn manager_path_empty_without_transport() {
        assert_eq!(hid_manager_path("", 0x3eb, 0x2402, 7), "");
    }
}
