#![cfg(target_os = "windows")]
//! HID device handles and the `HidD_*` / `HidP_*` queries made through them.

use core::mem::MaybeUninit;
use std::ffi::{c_void, OsStr};
use std::os::windows::ffi::OsStrExt;
use std::ptr::{null, null_mut};

use windows_sys::Win32::Devices::HumanInterfaceDevice::*;
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_FLAG_OVERLAPPED, FILE_SHARE_READ, FILE_SHARE_WRITE,
    OPEN_EXISTING,
};

/// Owned Win32 handle, closed on drop.
pub(super) struct OwnedHandle(HANDLE);

impl OwnedHandle {
    /// Take ownership of `raw`; `None` for null or `INVALID_HANDLE_VALUE`.
    pub(super) fn new(raw: HANDLE) -> Option<Self> {
        if raw.is_null() || raw == INVALID_HANDLE_VALUE {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub(super) fn raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.0) };
    }
}

/// How a device path is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Access {
    /// No data access; enough for attributes, strings and caps, and never
    /// blocked by another process holding the device.
    Query,
    /// Read/write with overlapped I/O.
    ReadWrite,
}

/// UTF-16 + NUL.
pub(super) fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Decode a NUL-terminated (or full) UTF-16 buffer.
pub(super) fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// Open a HID interface path. `Err` carries `GetLastError()`.
pub(super) fn open_device_handle(path: &str, access: Access) -> Result<OwnedHandle, u32> {
    let wide = wide(path);
    let (desired, flags) = match access {
        Access::Query => (0, FILE_ATTRIBUTE_NORMAL),
        Access::ReadWrite => (GENERIC_READ | GENERIC_WRITE, FILE_FLAG_OVERLAPPED),
    };

    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            desired,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            null(),
            OPEN_EXISTING,
            flags,
            null_mut(),
        )
    };

    OwnedHandle::new(handle).ok_or_else(|| unsafe { GetLastError() })
}

pub(super) fn attributes(handle: &OwnedHandle) -> Option<HIDD_ATTRIBUTES> {
    let mut attrs = HIDD_ATTRIBUTES {
        Size: std::mem::size_of::<HIDD_ATTRIBUTES>() as u32,
        VendorID: 0,
        ProductID: 0,
        VersionNumber: 0,
    };
    let ok = unsafe { HidD_GetAttributes(handle.raw(), &mut attrs) };
    (ok != 0).then_some(attrs)
}

/// Top-level collection caps, via the device's preparsed data.
pub(super) fn caps(handle: &OwnedHandle) -> Option<HIDP_CAPS> {
    let mut ppd: PHIDP_PREPARSED_DATA = 0;
    let ok = unsafe { HidD_GetPreparsedData(handle.raw(), &mut ppd) };
    if ok == 0 || ppd == 0 {
        return None;
    }

    let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
    let status = unsafe { HidP_GetCaps(ppd, caps.as_mut_ptr()) };
    unsafe { HidD_FreePreparsedData(ppd) };

    (status == HIDP_STATUS_SUCCESS).then(|| unsafe { caps.assume_init() })
}

/// Which `HidD_Get*String` to call.
#[derive(Clone, Copy, Debug)]
pub(super) enum StringKind {
    Serial,
    Manufacturer,
    Product,
}

/// Read one string descriptor; empty when the device has none.
pub(super) fn hid_string(handle: &OwnedHandle, kind: StringKind) -> String {
    // 126 characters is the USB string descriptor limit.
    let mut buf = [0u16; 128];
    let ptr = buf.as_mut_ptr() as *mut c_void;
    let len = std::mem::size_of_val(&buf) as u32;
    let ok = unsafe {
        match kind {
            StringKind::Serial => HidD_GetSerialNumberString(handle.raw(), ptr, len),
            StringKind::Manufacturer => HidD_GetManufacturerString(handle.raw(), ptr, len),
            StringKind::Product => HidD_GetProductString(handle.raw(), ptr, len),
        }
    };
    if ok == 0 {
        return String::new();
    }
    from_wide(&buf)
}
