#![cfg(target_os = "windows")]
//! SetupAPI walk over the present HID device interfaces.

use std::ptr::{addr_of, null, null_mut};

use tracing::warn;
use windows_sys::core::GUID;
use windows_sys::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInterfaces, SetupDiGetClassDevsW,
    SetupDiGetDeviceInterfaceDetailW, DIGCF_DEVICEINTERFACE, DIGCF_PRESENT, HDEVINFO,
    SP_DEVICE_INTERFACE_DATA, SP_DEVICE_INTERFACE_DETAIL_DATA_W,
};
use windows_sys::Win32::Devices::HumanInterfaceDevice::HidD_GetHidGuid;
use windows_sys::Win32::Foundation::{GetLastError, INVALID_HANDLE_VALUE};

use super::handle::from_wide;

/// The HID device interface class GUID.
pub(super) fn hid_guid() -> GUID {
    let mut guid = GUID {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };
    unsafe { HidD_GetHidGuid(&mut guid) };
    guid
}

/// Snapshot of present HID interfaces; destroyed on drop.
pub(super) struct InterfaceSet {
    set: HDEVINFO,
    guid: GUID,
}

impl InterfaceSet {
    pub(super) fn present_hid() -> Result<Self, u32> {
        let guid = hid_guid();
        let set = unsafe {
            SetupDiGetClassDevsW(
                &guid,
                null(),
                null_mut(),
                DIGCF_PRESENT | DIGCF_DEVICEINTERFACE,
            )
        };
        if set == INVALID_HANDLE_VALUE as HDEVINFO {
            return Err(unsafe { GetLastError() });
        }
        Ok(Self { set, guid })
    }

    /// Interface paths in SetupAPI order. Entries whose detail cannot be read are
    /// skipped.
    pub(super) fn paths(&self) -> impl Iterator<Item = String> + '_ {
        let mut index = 0u32;
        std::iter::from_fn(move || {
            let entry = self.interface(index)?;
            index += 1;
            Some(entry)
        })
        .flatten()
    }

    /// `None` at the end of the list; `Some(None)` for an unreadable entry.
    fn interface(&self, index: u32) -> Option<Option<String>> {
        let mut data = SP_DEVICE_INTERFACE_DATA {
            cbSize: std::mem::size_of::<SP_DEVICE_INTERFACE_DATA>() as u32,
            InterfaceClassGuid: self.guid,
            Flags: 0,
            Reserved: 0,
        };
        let ok =
            unsafe { SetupDiEnumDeviceInterfaces(self.set, null(), &self.guid, index, &mut data) };
        if ok == 0 {
            return None;
        }
        Some(self.detail_path(&data))
    }

    fn detail_path(&self, data: &SP_DEVICE_INTERFACE_DATA) -> Option<String> {
        // First call only reports the required size.
        let mut required = 0u32;
        unsafe {
            SetupDiGetDeviceInterfaceDetailW(self.set, data, null_mut(), 0, &mut required, null_mut())
        };
        if required == 0 {
            return None;
        }

        // u32 storage keeps the detail struct aligned.
        let mut storage = vec![0u32; (required as usize).div_ceil(4)];
        let detail = storage.as_mut_ptr() as *mut SP_DEVICE_INTERFACE_DETAIL_DATA_W;
        unsafe {
            (*detail).cbSize = std::mem::size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() as u32;
        }
        let ok = unsafe {
            SetupDiGetDeviceInterfaceDetailW(
                self.set,
                data,
                detail,
                required,
                null_mut(),
                null_mut(),
            )
        };
        if ok == 0 {
            warn!(error = unsafe { GetLastError() }, "SetupDiGetDeviceInterfaceDetailW failed");
            return None;
        }

        let path_ptr = unsafe { addr_of!((*detail).DevicePath) } as *const u16;
        let offset = path_ptr as usize - detail as usize;
        let units = (required as usize).saturating_sub(offset) / 2;
        let path = unsafe { std::slice::from_raw_parts(path_ptr, units) };
        Some(from_wide(path))
    }
}

impl Drop for InterfaceSet {
    fn drop(&mut self) {
        unsafe { SetupDiDestroyDeviceInfoList(self.set) };
    }
}
