//! Output report framing.
//!
//! Backends differ in where the report id goes. These helpers build the exact byte
//! layout each native write primitive expects, without touching a device.

use crate::error::{HidError, Result};

/// HID class request: SET_REPORT.
pub const HID_SET_REPORT: u8 = 0x09;

/// HID report type for output reports, high byte of SET_REPORT's wValue.
pub const HID_REPORT_TYPE_OUTPUT: u8 = 0x02;

/// Fixed-size output report: `[report_id, payload.., 0, 0, ..]`, `report_len` bytes.
///
/// `report_len` is the negotiated length including the id byte. A payload longer
/// than `report_len - 1` is rejected instead of truncated, and an unknown (zero)
/// length rejects everything.
pub fn fixed_output_report(report_len: usize, report_id: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let max = report_len.saturating_sub(1);
    if report_len == 0 || payload.len() > max {
        return Err(HidError::TooLarge {
            len: payload.len(),
            max,
        });
    }
    let mut buf = vec![0u8; report_len];
    buf[0] = report_id;
    buf[1..=payload.len()].copy_from_slice(payload);
    Ok(buf)
}

/// SET_REPORT data stage: `[report_id] ++ payload`.
pub fn control_report(report_id: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(payload.len() + 1);
    buf.push(report_id);
    buf.extend_from_slice(payload);
    buf
}

/// wValue for a SET_REPORT carrying an output report.
#[inline]
pub fn set_report_value(report_id: u8) -> u16 {
    (u16::from(HID_REPORT_TYPE_OUTPUT) << 8) | u16::from(report_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_report_pads_and_prefixes_id() {
        let buf = fixed_output_report(9, 0, &[0x01, 0x11]).unwrap();
        assert_eq!(buf, vec![0, 0x01, 0x11, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn fixed_report_accepts_exact_fit() {
        let payload = [0xAA; 8];
        let buf = fixed_output_report(9, 5, &payload).unwrap();
        assert_eq!(buf.len(), 9);
        assert_eq!(buf[0], 5);
        assert_eq!(&buf[1..], &payload);
    }

    #[test]
    fn fixed_report_rejects_oversize() {
        let err = fixed_output_report(9, 0, &[0u8; 9]).unwrap_err();
        assert_eq!(err, HidError::TooLarge { len: 9, max: 8 });
    }

    #[test]
    fn fixed_report_with_unknown_length_rejects_everything() {
        assert!(matches!(
            fixed_output_report(0, 0, &[]),
            Err(HidError::TooLarge { len: 0, max: 0 })
        ));
    }

    #[test]
    fn control_report_prepends_id() {
        assert_eq!(control_report(3, &[1, 2]), vec![3, 1, 2]);
        assert_eq!(control_report(0, &[]), vec![0]);
    }

    #[test]
    fn set_report_value_encodes_type_and_id() {
        assert_eq!(set_report_value(0), 0x0200);
        assert_eq!(set_report_value(7), 0x0207);
    }
}
