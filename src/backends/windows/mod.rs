#![cfg(target_os = "windows")]

//! Windows backend: SetupAPI enumeration plus the HID class driver.
//!
//! - Enumeration walks the present HID device interfaces and queries each through a
//!   zero-access handle, so devices held open elsewhere are still listed.
//! - `path` is the interface path itself and does not depend on the USB port.
//! - Writes always send the full fixed-size output report (`OutputReportByteLength`
//!   from the top-level caps) with the id in the first byte, using overlapped I/O
//!   bounded by the configured timeout.
//! - The context owns a hidden window registered for HID arrival/removal broadcasts;
//!   [`Backend::service`] drains its message queue.

mod handle;
mod notify;
mod setup;

use std::ops::ControlFlow;
use std::ptr::{null, null_mut};

use tracing::{debug, trace, warn};
use windows_sys::Win32::Foundation::{GetLastError, ERROR_IO_PENDING, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows_sys::Win32::Storage::FileSystem::WriteFile;
use windows_sys::Win32::System::Threading::{CreateEventW, WaitForSingleObject};
use windows_sys::Win32::System::IO::{CancelIo, GetOverlappedResult, OVERLAPPED};

use self::handle::{Access, OwnedHandle, StringKind};
use self::notify::NotifyWindow;
use self::setup::InterfaceSet;
use crate::backend::{Backend, NativeDevice};
use crate::config::HidConfig;
use crate::device_info::DeviceInfo;
use crate::error::{HidError, Result};
use crate::report::fixed_output_report;

/// Windows HID context.
pub struct WinHid {
    config: HidConfig,
    notify: NotifyWindow,
}

impl Backend for WinHid {
    /// The interface path already lives in `DeviceInfo::path`.
    type Candidate = ();
    type Device = WinDevice;

    fn init(config: &HidConfig) -> Result<Self> {
        let notify = NotifyWindow::create(&setup::hid_guid()).map_err(HidError::Init)?;
        Ok(Self {
            config: config.clone(),
            notify,
        })
    }

    fn for_each<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Self::Candidate, &DeviceInfo) -> ControlFlow<()>,
    {
        let set = InterfaceSet::present_hid()
            .map_err(|code| HidError::Native(format!("SetupDiGetClassDevsW failed ({code})")))?;
        for path in set.paths() {
            let Some(info) = describe(path) else {
                continue;
            };
            if visit(&(), &info).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn open(&self, _candidate: &(), info: &DeviceInfo) -> Result<WinDevice> {
        let handle = handle::open_device_handle(&info.path, Access::ReadWrite)
            .map_err(|code| HidError::Denied(format!("{info}: CreateFileW failed ({code})")))?;
        Ok(WinDevice {
            handle,
            output_report_len: usize::from(info.max_output_report_len.unwrap_or(0)),
            timeout_ms: u32::try_from(self.config.io_timeout_ms).unwrap_or(u32::MAX),
        })
    }

    fn service(&mut self) -> Result<bool> {
        Ok(self.notify.pump(self.config.service_iterations))
    }
}

/// Query one interface path. Paths that cannot be opened even for query are
/// skipped.
fn describe(path: String) -> Option<DeviceInfo> {
    let handle = match handle::open_device_handle(&path, Access::Query) {
        Ok(handle) => handle,
        Err(code) => {
            trace!(path = %path, error = code, "skipping unopenable HID interface");
            return None;
        }
    };

    let mut info = DeviceInfo {
        serial_number: handle::hid_string(&handle, StringKind::Serial),
        manufacturer: handle::hid_string(&handle, StringKind::Manufacturer),
        product: handle::hid_string(&handle, StringKind::Product),
        ..Default::default()
    };
    if let Some(attrs) = handle::attributes(&handle) {
        info.vendor_id = attrs.VendorID;
        info.product_id = attrs.ProductID;
        info.release_number = attrs.VersionNumber;
    }
    if let Some(caps) = handle::caps(&handle) {
        info.usage_page = caps.UsagePage;
        info.usage = caps.Usage;
        info.max_output_report_len = Some(caps.OutputReportByteLength);
    }
    info.path = path;
    Some(info)
}

/// Overlapped read/write handle on a HID interface.
pub struct WinDevice {
    handle: OwnedHandle,
    /// Full report length including the id byte; 0 when caps were unavailable.
    output_report_len: usize,
    timeout_ms: u32,
}

impl NativeDevice for WinDevice {
    fn write(&self, report_id: u8, payload: &[u8]) -> Result<usize> {
        let report = fixed_output_report(self.output_report_len, report_id, payload)?;

        let event = OwnedHandle::new(unsafe { CreateEventW(null(), 1, 0, null()) })
            .ok_or_else(|| HidError::Native(format!("CreateEventW failed ({})", unsafe {
                GetLastError()
            })))?;
        let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };
        overlapped.hEvent = event.raw();

        let ok = unsafe {
            WriteFile(
                self.handle.raw(),
                report.as_ptr(),
                report.len() as u32,
                null_mut(),
                &mut overlapped,
            )
        };
        if ok == 0 {
            let err = unsafe { GetLastError() };
            if err != ERROR_IO_PENDING {
                return Err(HidError::Native(format!("WriteFile failed ({err})")));
            }
            let wait = unsafe { WaitForSingleObject(event.raw(), self.timeout_ms) };
            if wait == WAIT_TIMEOUT {
                let mut ignored = 0u32;
                unsafe {
                    CancelIo(self.handle.raw());
                    // The buffer and OVERLAPPED must outlive the cancelled request.
                    GetOverlappedResult(self.handle.raw(), &overlapped, &mut ignored, 1);
                }
                debug!(report_id, "HID write timed out");
                return Err(HidError::Timeout);
            }
            if wait != WAIT_OBJECT_0 {
                let err = unsafe { GetLastError() };
                unsafe { CancelIo(self.handle.raw()) };
                let mut ignored = 0u32;
                unsafe { GetOverlappedResult(self.handle.raw(), &overlapped, &mut ignored, 1) };
                return Err(HidError::Native(format!("WaitForSingleObject failed ({err})")));
            }
        }

        let mut written = 0u32;
        let ok = unsafe { GetOverlappedResult(self.handle.raw(), &overlapped, &mut written, 0) };
        if ok == 0 {
            let err = unsafe { GetLastError() };
            warn!(error = err, "overlapped HID write failed");
            return Err(HidError::Native(format!("GetOverlappedResult failed ({err})")));
        }
        Ok(written as usize)
    }
}
