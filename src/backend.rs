//! The platform seam.
//!
//! A [`Backend`] owns the native subsystem context (libusb context, IOKit manager,
//! Windows notification window) and knows how to walk the attached devices and open
//! one. Exactly one implementation, [`Native`](crate::backends::Native), is compiled
//! in per target; [`Hid`](crate::Hid) is generic over the trait only so tests can
//! substitute a scripted backend. There is no dynamic dispatch.
//!
//! Teardown is `Drop`: dropping a backend releases the native context, and dropping
//! a `Backend::Device` releases the device, each exactly once.

use std::ops::ControlFlow;

use crate::config::HidConfig;
use crate::device_info::DeviceInfo;
use crate::error::{HidError, Result};

/// An open native device handle.
pub trait NativeDevice {
    /// Send one output report, blocking up to the configured timeout.
    ///
    /// Returns the number of bytes the backend reports as written; the framing (and
    /// so the count) is backend-specific.
    fn write(&self, report_id: u8, payload: &[u8]) -> Result<usize>;

    /// Fetch one input report into `buf`.
    ///
    /// Backends without a native "get report" primitive keep the default, which
    /// refuses explicitly instead of returning zero bytes.
    fn read(&self, report_id: u8, buf: &mut [u8]) -> Result<usize> {
        let _ = (report_id, buf);
        Err(HidError::Unsupported("read"))
    }
}

/// Native HID subsystem.
pub trait Backend: Sized {
    /// Native per-device token handed to the visitor; only valid during the visit.
    type Candidate;

    /// Owned open device.
    type Device: NativeDevice;

    /// Perform the one native initialization call.
    fn init(config: &HidConfig) -> Result<Self>;

    /// Query the OS for the devices present right now and hand each one to `visit`
    /// until it returns `Break` or the list is exhausted.
    ///
    /// Nothing is cached between calls.
    fn for_each<F>(&self, visit: F) -> Result<()>
    where
        F: FnMut(&Self::Candidate, &DeviceInfo) -> ControlFlow<()>;

    /// Open the device behind `candidate`.
    ///
    /// Must either return a fully usable device or release everything it acquired.
    fn open(&self, candidate: &Self::Candidate, info: &DeviceInfo) -> Result<Self::Device>;

    /// Pump pending platform notifications, bounded by the config.
    ///
    /// Returns `true` when the pump saw activity. Backends without a notification
    /// loop keep the default no-op.
    fn service(&mut self) -> Result<bool> {
        Ok(false)
    }
}
