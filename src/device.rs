use std::fmt;

use crate::backend::Backend;
use crate::backends::Native;
use crate::device_info::DeviceInfo;

/// An open HID device.
///
/// Opaque and not clonable: it owns the native handle and releases it exactly once
/// when dropped. Obtained from [`Hid::open`](crate::Hid::open) and friends; I/O goes
/// through [`Hid::write`](crate::Hid::write) / [`Hid::read`](crate::Hid::read).
pub struct Device<B: Backend = Native> {
    native: B::Device,
    info: DeviceInfo,
}

impl<B: Backend> Device<B> {
    pub(crate) fn new(native: B::Device, info: DeviceInfo) -> Self {
        Self { native, info }
    }

    /// The enumeration record this device was opened from.
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn path(&self) -> &str {
        &self.info.path
    }

    pub(crate) fn native(&self) -> &B::Device {
        &self.native
    }
}

impl<B: Backend> fmt::Debug for Device<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("info", &self.info).finish_non_exhaustive()
    }
}
