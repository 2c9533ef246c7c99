//! Minimal IOKit HID bindings; CoreFoundation comes from `core-foundation-sys`.
#![allow(non_upper_case_globals, non_snake_case, non_camel_case_types)]

use core_foundation_sys::base::{CFAllocatorRef, CFIndex, CFTypeRef};
use core_foundation_sys::dictionary::CFDictionaryRef;
use core_foundation_sys::runloop::CFRunLoopRef;
use core_foundation_sys::set::CFSetRef;
use core_foundation_sys::string::CFStringRef;

pub type IOReturn = i32;
pub type IOOptionBits = u32;
pub type IOHIDReportType = u32;

#[repr(C)]
pub struct __IOHIDManager {
    _private: [u8; 0],
}
pub type IOHIDManagerRef = *mut __IOHIDManager;

#[repr(C)]
pub struct __IOHIDDevice {
    _private: [u8; 0],
}
pub type IOHIDDeviceRef = *mut __IOHIDDevice;

pub const kIOReturnSuccess: IOReturn = 0;
pub const kIOReturnExclusiveAccess: IOReturn = 0xE000_02C5_u32 as i32;
pub const kIOReturnTimeout: IOReturn = 0xE000_02D6_u32 as i32;
pub const kIOReturnNotPermitted: IOReturn = 0xE000_02E2_u32 as i32;
pub const kIOReturnNotPrivileged: IOReturn = 0xE000_02C1_u32 as i32;
pub const kIOReturnNoDevice: IOReturn = 0xE000_02C0_u32 as i32;

pub const kIOHIDOptionsTypeNone: IOOptionBits = 0;
pub const kIOHIDOptionsTypeSeizeDevice: IOOptionBits = 1;

pub const kIOHIDReportTypeInput: IOHIDReportType = 0;
pub const kIOHIDReportTypeOutput: IOHIDReportType = 1;

pub const kIOHIDVendorIDKey: &str = "VendorID";
pub const kIOHIDProductIDKey: &str = "ProductID";
pub const kIOHIDTransportKey: &str = "Transport";
pub const kIOHIDLocationIDKey: &str = "LocationID";
pub const kIOHIDVersionNumberKey: &str = "VersionNumber";
pub const kIOHIDSerialNumberKey: &str = "SerialNumber";
pub const kIOHIDManufacturerKey: &str = "Manufacturer";
pub const kIOHIDProductKey: &str = "Product";
pub const kIOHIDPrimaryUsagePageKey: &str = "PrimaryUsagePage";
pub const kIOHIDPrimaryUsageKey: &str = "PrimaryUsage";
pub const kIOHIDMaxOutputReportSizeKey: &str = "MaxOutputReportSize";

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    pub fn IOHIDManagerCreate(allocator: CFAllocatorRef, options: IOOptionBits) -> IOHIDManagerRef;
    pub fn IOHIDManagerSetDeviceMatching(manager: IOHIDManagerRef, matching: CFDictionaryRef);
    pub fn IOHIDManagerOpen(manager: IOHIDManagerRef, options: IOOptionBits) -> IOReturn;
    pub fn IOHIDManagerClose(manager: IOHIDManagerRef, options: IOOptionBits) -> IOReturn;
    pub fn IOHIDManagerScheduleWithRunLoop(
        manager: IOHIDManagerRef,
        run_loop: CFRunLoopRef,
        run_loop_mode: CFStringRef,
    );
    pub fn IOHIDManagerUnscheduleFromRunLoop(
        manager: IOHIDManagerRef,
        run_loop: CFRunLoopRef,
        run_loop_mode: CFStringRef,
    );
    pub fn IOHIDManagerCopyDevices(manager: IOHIDManagerRef) -> CFSetRef;

    pub fn IOHIDDeviceGetProperty(device: IOHIDDeviceRef, key: CFStringRef) -> CFTypeRef;
    pub fn IOHIDDeviceOpen(device: IOHIDDeviceRef, options: IOOptionBits) -> IOReturn;
    pub fn IOHIDDeviceClose(device: IOHIDDeviceRef, options: IOOptionBits) -> IOReturn;
    pub fn IOHIDDeviceSetReport(
        device: IOHIDDeviceRef,
        report_type: IOHIDReportType,
        report_id: CFIndex,
        report: *const u8,
        report_length: CFIndex,
    ) -> IOReturn;
    pub fn IOHIDDeviceGetReport(
        device: IOHIDDeviceRef,
        report_type: IOHIDReportType,
        report_id: CFIndex,
        report: *mut u8,
        report_length: *mut CFIndex,
    ) -> IOReturn;
}
