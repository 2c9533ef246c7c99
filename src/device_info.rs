//! Device identity snapshot and selection rules.
//!
//! [`DeviceInfo`] is a cloneable description of one attached HID device, built fresh
//! on every enumeration. Backends fill what the platform reports; strings that could
//! not be read are empty rather than errors.
//!
//! ## Path conventions
//! `path` is an opaque, backend-specific key used to find the same device again in a
//! later enumeration:
//! - libusb: `vvvv:pppp/bus/port/port/...` (changes when moved to another port)
//! - IOKit: `Transport_vvvv_pppp_locationid` (empty if the transport is unknown)
//! - Windows: the HID device-interface path (port independent)
//!
//! Treat it as identity within one host and one topology, nothing more.
//!
//! ## Selection rules
//! [`DeviceFilter`] and [`Criteria`] encode the shared rules used by
//! `enumerate` and `open`: a `0` vendor or product id is a wildcard, and the
//! placeholder pair `0000:0000` never matches anything.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot describing a single attached HID device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// USB Vendor ID.
    pub vendor_id: u16,

    /// USB Product ID.
    pub product_id: u16,

    /// Backend-specific identity string (see module docs).
    pub path: String,

    /// iSerialNumber string, or empty.
    pub serial_number: String,

    /// Device release number (bcdDevice / VersionNumber).
    pub release_number: u16,

    /// iManufacturer string, or empty.
    pub manufacturer: String,

    /// iProduct string, or empty.
    pub product: String,

    /// HID usage page of the top-level collection, `0` when the backend cannot tell.
    pub usage_page: u16,

    /// HID usage of the top-level collection, `0` when the backend cannot tell.
    pub usage: u16,

    /// Negotiated output report length including the report id byte, when known.
    pub max_output_report_len: Option<u16>,
}

impl DeviceInfo {
    /// `false` for the `0000:0000` placeholder records some stacks report.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !(self.vendor_id == 0 && self.product_id == 0)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} {}",
            self.vendor_id, self.product_id, self.path
        )?;
        if !self.product.is_empty() {
            write!(f, " ({})", self.product)?;
        }
        Ok(())
    }
}

/// Vendor/product filter used by [`Hid::enumerate`](crate::Hid::enumerate).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceFilter {
    pub const ANY: DeviceFilter = DeviceFilter {
        vendor_id: 0,
        product_id: 0,
    };

    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    pub fn matches(&self, info: &DeviceInfo) -> bool {
        info.is_valid()
            && (self.vendor_id == 0 || self.vendor_id == info.vendor_id)
            && (self.product_id == 0 || self.product_id == info.product_id)
    }
}

/// Selection used by [`Hid::open_with`](crate::Hid::open_with).
///
/// The first enumerated device matching the filter and, when given, the exact serial
/// number wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Criteria {
    pub filter: DeviceFilter,
    pub serial_number: Option<String>,
}

impl Criteria {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            filter: DeviceFilter::new(vendor_id, product_id),
            serial_number: None,
        }
    }

    /// Require an exact serial number. An empty string means "any serial".
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        let serial = serial.into();
        self.serial_number = if serial.is_empty() { None } else { Some(serial) };
        self
    }

    pub fn matches(&self, info: &DeviceInfo) -> bool {
        self.filter.matches(info)
            && self
                .serial_number
                .as_deref()
                .map_or(true, |s| s == info.serial_number)
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x}",
            self.filter.vendor_id, self.filter.product_id
        )?;
        if let Some(serial) = &self.serial_number {
            write!(f, " serial={serial}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(vid: u16, pid: u16, serial: &str) -> DeviceInfo {
        DeviceInfo {
            vendor_id: vid,
            product_id: pid,
            serial_number: serial.into(),
            ..Default::default()
        }
    }

    #[test]
    fn null_pair_never_matches() {
        let null = info(0, 0, "");
        assert!(!null.is_valid());
        assert!(!DeviceFilter::ANY.matches(&null));
        assert!(!Criteria::new(0, 0).matches(&null));
    }

    #[test]
    fn zero_ids_are_wildcards() {
        let d = info(0x3eb, 0x2402, "");
        assert!(DeviceFilter::ANY.matches(&d));
        assert!(DeviceFilter::new(0x3eb, 0).matches(&d));
        assert!(DeviceFilter::new(0, 0x2402).matches(&d));
        assert!(!DeviceFilter::new(0x3eb, 0x2403).matches(&d));
        assert!(!DeviceFilter::new(0x1234, 0).matches(&d));
    }

    #[test]
    fn only_one_id_zero_is_still_valid() {
        assert!(DeviceFilter::ANY.matches(&info(0, 0x0001, "")));
        assert!(DeviceFilter::ANY.matches(&info(0x0001, 0, "")));
    }

    #[test]
    fn serial_must_match_exactly_when_given() {
        let d = info(0x3eb, 0x2402, "A1B2");
        assert!(Criteria::new(0x3eb, 0x2402).matches(&d));
        assert!(Criteria::new(0x3eb, 0x2402).with_serial("A1B2").matches(&d));
        assert!(!Criteria::new(0x3eb, 0x2402).with_serial("a1b2").matches(&d));
        assert!(Criteria::new(0x3eb, 0x2402).with_serial("").matches(&d));
    }

    #[test]
    fn display_is_compact() {
        let mut d = info(0x3eb, 0x2402, "");
        d.path = "03eb:2402/1/4".into();
        d.product = "Omni".into();
        assert_eq!(d.to_string(), "03eb:2402 03eb:2402/1/4 (Omni)");
        assert_eq!(
            Criteria::new(0x3eb, 0).with_serial("X").to_string(),
            "03eb:0000 serial=X"
        );
    }
}
