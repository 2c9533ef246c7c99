//! IOKit backend (`IOHIDManager`), used on macOS.
//!
//! The manager matches every HID device and is scheduled on the run loop of the
//! thread that initialized it; [`Backend::service`] drives that run loop for a
//! bounded number of short slices. Device paths are built from the `Transport`,
//! vendor/product and `LocationID` properties.
//!
//! Opening seizes the device. Writes are `SetReport(Output)` with the report id
//! passed separately from the payload; reads are `GetReport(Input)`.

mod ffi;

use std::ffi::c_void;
use std::ops::ControlFlow;
use std::ptr;

use core_foundation::base::TCFType;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_foundation_sys::base::{
    kCFAllocatorDefault, CFGetTypeID, CFIndex, CFRelease, CFRetain, CFTypeRef,
};
use core_foundation_sys::number::{CFNumberGetTypeID, CFNumberRef};
use core_foundation_sys::runloop::{
    kCFRunLoopDefaultMode, kCFRunLoopRunHandledSource, CFRunLoopGetCurrent, CFRunLoopRef,
    CFRunLoopRunInMode,
};
use core_foundation_sys::set::{CFSetGetCount, CFSetGetValues};
use core_foundation_sys::string::{CFStringGetTypeID, CFStringRef};
use tracing::{trace, warn};

use self::ffi::*;
use crate::backend::{Backend, NativeDevice};
use crate::config::HidConfig;
use crate::device_info::DeviceInfo;
use crate::error::{HidError, Result};
use crate::path::hid_manager_path;

/// `IOHIDManager` scheduled on the initializing thread's run loop.
pub struct HidManager {
    manager: IOHIDManagerRef,
    run_loop: CFRunLoopRef,
    config: HidConfig,
}

/// Borrowed device reference from the manager's device set.
pub struct DeviceRef(IOHIDDeviceRef);

impl Backend for HidManager {
    type Candidate = DeviceRef;
    type Device = MacDevice;

    fn init(config: &HidConfig) -> Result<Self> {
        let manager = unsafe { IOHIDManagerCreate(kCFAllocatorDefault, kIOHIDOptionsTypeNone) };
        if manager.is_null() {
            return Err(HidError::Init("IOHIDManagerCreate returned null".into()));
        }

        let run_loop = unsafe {
            // NULL matching dictionary: every HID device.
            IOHIDManagerSetDeviceMatching(manager, ptr::null());
            let status = IOHIDManagerOpen(manager, kIOHIDOptionsTypeNone);
            if status != kIOReturnSuccess {
                // Devices stay enumerable; individual opens report their own errors.
                warn!(status = format_args!("{status:#010x}"), "IOHIDManagerOpen failed");
            }
            let run_loop = CFRunLoopGetCurrent();
            IOHIDManagerScheduleWithRunLoop(manager, run_loop, kCFRunLoopDefaultMode);
            run_loop
        };

        Ok(Self {
            manager,
            run_loop,
            config: config.clone(),
        })
    }

    fn for_each<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Self::Candidate, &DeviceInfo) -> ControlFlow<()>,
    {
        let set = unsafe { IOHIDManagerCopyDevices(self.manager) };
        if set.is_null() {
            return Ok(());
        }
        let _set_guard = CfOwned(set as CFTypeRef);

        let count = unsafe { CFSetGetCount(set) }.max(0) as usize;
        let mut values: Vec<*const c_void> = vec![ptr::null(); count];
        unsafe { CFSetGetValues(set, values.as_mut_ptr()) };

        for raw in values {
            if raw.is_null() {
                continue;
            }
            let device = DeviceRef(raw as IOHIDDeviceRef);
            let info = describe(device.0);
            if visit(&device, &info).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn open(&self, candidate: &DeviceRef, info: &DeviceInfo) -> Result<MacDevice> {
        let status = unsafe { IOHIDDeviceOpen(candidate.0, kIOHIDOptionsTypeSeizeDevice) };
        if status != kIOReturnSuccess {
            return Err(HidError::Denied(format!(
                "{info}: IOHIDDeviceOpen returned {status:#010x}"
            )));
        }
        // The set that handed us the reference is released after enumeration.
        unsafe { CFRetain(candidate.0 as CFTypeRef) };
        Ok(MacDevice { device: candidate.0 })
    }

    fn service(&mut self) -> Result<bool> {
        let slice = self.config.service_slice().as_secs_f64();
        let mut handled = false;
        for _ in 0..self.config.service_iterations {
            let result = unsafe { CFRunLoopRunInMode(kCFRunLoopDefaultMode, slice, 1) };
            if result != kCFRunLoopRunHandledSource {
                break;
            }
            handled = true;
        }
        if handled {
            trace!("run loop handled HID sources");
        }
        Ok(handled)
    }
}

impl Drop for HidManager {
    fn drop(&mut self) {
        unsafe {
            IOHIDManagerUnscheduleFromRunLoop(self.manager, self.run_loop, kCFRunLoopDefaultMode);
            IOHIDManagerClose(self.manager, kIOHIDOptionsTypeNone);
            CFRelease(self.manager as CFTypeRef);
        }
    }
}

/// Releases a CF object obtained under the create/copy rule.
struct CfOwned(CFTypeRef);

impl Drop for CfOwned {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) };
    }
}

fn describe(device: IOHIDDeviceRef) -> DeviceInfo {
    let vendor_id = number_property(device, kIOHIDVendorIDKey).unwrap_or(0) as u16;
    let product_id = number_property(device, kIOHIDProductIDKey).unwrap_or(0) as u16;
    let location_id = number_property(device, kIOHIDLocationIDKey).unwrap_or(0) as u32;
    let transport = string_property(device, kIOHIDTransportKey).unwrap_or_default();

    DeviceInfo {
        vendor_id,
        product_id,
        path: hid_manager_path(&transport, vendor_id, product_id, location_id),
        serial_number: string_property(device, kIOHIDSerialNumberKey).unwrap_or_default(),
        release_number: number_property(device, kIOHIDVersionNumberKey).unwrap_or(0) as u16,
        manufacturer: string_property(device, kIOHIDManufacturerKey).unwrap_or_default(),
        product: string_property(device, kIOHIDProductKey).unwrap_or_default(),
        usage_page: number_property(device, kIOHIDPrimaryUsagePageKey).unwrap_or(0) as u16,
        usage: number_property(device, kIOHIDPrimaryUsageKey).unwrap_or(0) as u16,
        max_output_report_len: number_property(device, kIOHIDMaxOutputReportSizeKey)
            .map(|len| len as u16),
    }
}

/// Property lookup; the result follows the get rule and is not owned.
fn property(device: IOHIDDeviceRef, key: &'static str) -> CFTypeRef {
    let key = CFString::from_static_string(key);
    unsafe { IOHIDDeviceGetProperty(device, key.as_concrete_TypeRef()) }
}

fn number_property(device: IOHIDDeviceRef, key: &'static str) -> Option<i64> {
    let value = property(device, key);
    if value.is_null() || unsafe { CFGetTypeID(value) != CFNumberGetTypeID() } {
        return None;
    }
    let number = unsafe { CFNumber::wrap_under_get_rule(value as CFNumberRef) };
    number.to_i64()
}

fn string_property(device: IOHIDDeviceRef, key: &'static str) -> Option<String> {
    let value = property(device, key);
    if value.is_null() || unsafe { CFGetTypeID(value) != CFStringGetTypeID() } {
        return None;
    }
    let s = unsafe { CFString::wrap_under_get_rule(value as CFStringRef) };
    Some(s.to_string())
}

fn io_error(what: &str, status: IOReturn) -> HidError {
    match status {
        kIOReturnTimeout => HidError::Timeout,
        kIOReturnExclusiveAccess | kIOReturnNotPermitted | kIOReturnNotPrivileged => {
            HidError::Denied(format!("{what} returned {status:#010x}"))
        }
        kIOReturnNoDevice => HidError::NotFound(format!("{what} returned {status:#010x}")),
        _ => HidError::Native(format!("{what} returned {status:#010x}")),
    }
}

/// Seized IOKit device.
pub struct MacDevice {
    device: IOHIDDeviceRef,
}

impl NativeDevice for MacDevice {
    fn write(&self, report_id: u8, payload: &[u8]) -> Result<usize> {
        let status = unsafe {
            IOHIDDeviceSetReport(
                self.device,
                kIOHIDReportTypeOutput,
                CFIndex::from(report_id),
                payload.as_ptr(),
                payload.len() as CFIndex,
            )
        };
        if status != kIOReturnSuccess {
            return Err(io_error("IOHIDDeviceSetReport", status));
        }
        Ok(payload.len())
    }

    fn read(&self, report_id: u8, buf: &mut [u8]) -> Result<usize> {
        let mut len = buf.len() as CFIndex;
        let status = unsafe {
            IOHIDDeviceGetReport(
                self.device,
                kIOHIDReportTypeInput,
                CFIndex::from(report_id),
                buf.as_mut_ptr(),
                &mut len,
            )
        };
        if status != kIOReturnSuccess {
            return Err(io_error("IOHIDDeviceGetReport", status));
        }
        Ok(len.max(0) as usize)
    }
}

impl Drop for MacDevice {
    fn drop(&mut self) {
        unsafe {
            IOHIDDeviceClose(self.device, kIOHIDOptionsTypeNone);
            CFRelease(self.device as CFTypeRef);
        }
    }
}
