//! libusb backend (`rusb`), used on Linux and the other non-Apple Unixes.
//!
//! Devices are identified by bus/port topology, so the path changes when a device is
//! moved to another port. Opening claims the configured interface (detaching a bound
//! kernel driver first when allowed); dropping the device releases the interface and
//! then closes the handle.
//!
//! Writes go out either as interrupt transfers on the configured OUT endpoint (the
//! report id is not sent) or as a class SET_REPORT control transfer carrying
//! `[report_id] ++ payload`, per [`WriteMode`].

use std::ops::ControlFlow;
use std::time::Duration;

use rusb::{Context, DeviceHandle, Direction, Recipient, RequestType, UsbContext};
use tracing::{debug, trace, warn};

use crate::backend::{Backend, NativeDevice};
use crate::config::{HidConfig, WriteMode};
use crate::device_info::DeviceInfo;
use crate::error::{HidError, Result};
use crate::path::usb_topology_path;
use crate::report::{control_report, set_report_value, HID_SET_REPORT};

impl From<rusb::Error> for HidError {
    fn from(err: rusb::Error) -> Self {
        match err {
            rusb::Error::Timeout => HidError::Timeout,
            rusb::Error::Access | rusb::Error::Busy => HidError::Denied(err.to_string()),
            rusb::Error::NoDevice | rusb::Error::NotFound => HidError::NotFound(err.to_string()),
            rusb::Error::NotSupported => HidError::Unsupported("libusb operation"),
            other => HidError::Native(other.to_string()),
        }
    }
}

/// libusb context.
pub struct LibUsb {
    context: Context,
    config: HidConfig,
}

impl Backend for LibUsb {
    type Candidate = rusb::Device<Context>;
    type Device = LibUsbDevice;

    fn init(config: &HidConfig) -> Result<Self> {
        let context = Context::new().map_err(|e| HidError::Init(format!("libusb_init: {e}")))?;
        Ok(Self {
            context,
            config: config.clone(),
        })
    }

    fn for_each<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Self::Candidate, &DeviceInfo) -> ControlFlow<()>,
    {
        let devices = self.context.devices()?;
        for device in devices.iter() {
            let Some(info) = describe(&device) else {
                continue;
            };
            if visit(&device, &info).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn open(&self, candidate: &Self::Candidate, info: &DeviceInfo) -> Result<LibUsbDevice> {
        let interface = self.config.interface;
        let handle = candidate
            .open()
            .map_err(|e| HidError::Denied(format!("{info}: libusb_open: {e}")))?;

        if self.config.detach_kernel_driver {
            // NotFound (no driver bound) and NotSupported (non-Linux) are expected.
            if let Err(e) = handle.detach_kernel_driver(interface) {
                trace!(device = %info, interface, error = %e, "kernel driver not detached");
            }
        }

        if let Err(e) = handle.claim_interface(interface) {
            warn!(device = %info, interface, error = %e, "failed to claim interface");
            return Err(HidError::Denied(format!(
                "{info}: claim interface {interface}: {e}"
            )));
        }

        Ok(LibUsbDevice {
            handle,
            interface,
            out_endpoint: self.config.out_endpoint,
            write_mode: self.config.write_mode,
            timeout: self.config.io_timeout(),
        })
    }
}

/// Build the enumeration record for one libusb device.
///
/// String descriptors need a short-lived open handle; when the device cannot be
/// opened they stay empty. A descriptor read failure drops the device from the pass.
fn describe(device: &rusb::Device<Context>) -> Option<DeviceInfo> {
    let desc = match device.device_descriptor() {
        Ok(desc) => desc,
        Err(e) => {
            warn!(bus = device.bus_number(), address = device.address(), error = %e,
                "skipping device without a readable descriptor");
            return None;
        }
    };

    let ports = device.port_numbers().unwrap_or_default();
    let path = usb_topology_path(
        desc.vendor_id(),
        desc.product_id(),
        device.bus_number(),
        &ports,
    );

    let (serial_number, manufacturer, product) = match device.open() {
        Ok(handle) => (
            handle.read_serial_number_string_ascii(&desc).unwrap_or_default(),
            handle.read_manufacturer_string_ascii(&desc).unwrap_or_default(),
            handle.read_product_string_ascii(&desc).unwrap_or_default(),
        ),
        Err(e) => {
            trace!(path = %path, error = %e, "no string descriptors");
            Default::default()
        }
    };

    let version = desc.device_version();
    Some(DeviceInfo {
        vendor_id: desc.vendor_id(),
        product_id: desc.product_id(),
        path,
        serial_number,
        release_number: bcd_from_version(version.major(), version.minor(), version.sub_minor()),
        manufacturer,
        product,
        usage_page: 0,
        usage: 0,
        max_output_report_len: None,
    })
}

/// Re-pack rusb's decoded `bcdDevice` into its wire form.
fn bcd_from_version(major: u8, minor: u8, sub_minor: u8) -> u16 {
    let major = u16::from(major);
    ((major / 10) << 12)
        | ((major % 10) << 8)
        | (u16::from(minor & 0x0f) << 4)
        | u16::from(sub_minor & 0x0f)
}

/// Claimed libusb interface.
pub struct LibUsbDevice {
    handle: DeviceHandle<Context>,
    interface: u8,
    out_endpoint: u8,
    write_mode: WriteMode,
    timeout: Duration,
}

impl NativeDevice for LibUsbDevice {
    fn write(&self, report_id: u8, payload: &[u8]) -> Result<usize> {
        match self.write_mode {
            WriteMode::Interrupt => {
                Ok(self
                    .handle
                    .write_interrupt(self.out_endpoint, payload, self.timeout)?)
            }
            WriteMode::Control => {
                let buf = control_report(report_id, payload);
                let request_type =
                    rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface);
                let sent = self.handle.write_control(
                    request_type,
                    HID_SET_REPORT,
                    set_report_value(report_id),
                    u16::from(self.interface),
                    &buf,
                    self.timeout,
                )?;
                // The id byte is framing, not payload.
                Ok(sent.saturating_sub(1))
            }
        }
    }
}

impl Drop for LibUsbDevice {
    fn drop(&mut self) {
        // The handle itself closes when the field drops, after this.
        if let Err(e) = self.handle.release_interface(self.interface) {
            debug!(interface = self.interface, error = %e, "release interface failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_repacks_decoded_version() {
        assert_eq!(bcd_from_version(1, 0, 0), 0x0100);
        assert_eq!(bcd_from_version(2, 1, 3), 0x0213);
        assert_eq!(bcd_from_version(12, 3, 4), 0x1234);
    }

    #[test]
    fn rusb_errors_map_to_hid_errors() {
        assert_eq!(HidError::from(rusb::Error::Timeout), HidError::Timeout);
        assert!(matches!(
            HidError::from(rusb::Error::Access),
            HidError::Denied(_)
        ));
        assert!(matches!(
            HidError::from(rusb::Error::Busy),
            HidError::Denied(_)
        ));
        assert!(matches!(
            HidError::from(rusb::Error::NoDevice),
            HidError::NotFound(_)
        ));
        assert!(matches!(
            HidError::from(rusb::Error::Pipe),
            HidError::Native(_)
        ));
    }
}
