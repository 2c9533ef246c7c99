#![cfg(target_os = "windows")]
//! Hidden message-only style window registered for HID arrival/removal broadcasts.
//!
//! Windows delivers `WM_DEVICECHANGE` only to a window, so the backend keeps one for
//! its lifetime. The window procedure bumps a per-thread counter; [`NotifyWindow::pump`]
//! drains the queue and reports whether the counter moved.

use std::cell::Cell;
use std::ffi::c_void;
use std::ptr::{null, null_mut};

use tracing::{debug, trace};
use windows_sys::core::GUID;
use windows_sys::Win32::Foundation::{
    GetLastError, ERROR_CLASS_ALREADY_EXISTS, HMODULE, HWND, LPARAM, LRESULT, WPARAM,
};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, PeekMessageW,
    RegisterClassExW, RegisterDeviceNotificationW, TranslateMessage, UnregisterClassW,
    UnregisterDeviceNotification, CW_USEDEFAULT, DBT_DEVICEARRIVAL, DBT_DEVICEREMOVECOMPLETE,
    DBT_DEVTYP_DEVICEINTERFACE, DEVICE_NOTIFY_WINDOW_HANDLE, DEV_BROADCAST_DEVICEINTERFACE_W,
    HDEVNOTIFY, MSG, PM_REMOVE, WM_DEVICECHANGE, WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
};

use super::handle::wide;

const CLASS_NAME: &str = "hidwire-device-notify";

thread_local! {
    static DEVICE_CHANGES: Cell<u64> = const { Cell::new(0) };
}

unsafe extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if msg == WM_DEVICECHANGE {
        let event = wparam as u32;
        if event == DBT_DEVICEARRIVAL || event == DBT_DEVICEREMOVECOMPLETE {
            DEVICE_CHANGES.with(|c| c.set(c.get().wrapping_add(1)));
            trace!(arrival = event == DBT_DEVICEARRIVAL, "HID device change");
        }
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

pub(super) struct NotifyWindow {
    class: Vec<u16>,
    instance: HMODULE,
    hwnd: HWND,
    notify: HDEVNOTIFY,
}

impl NotifyWindow {
    /// Register the class, create the window and subscribe to `guid` interface
    /// broadcasts. Everything acquired is undone if a later step fails.
    pub(super) fn create(guid: &GUID) -> Result<Self, String> {
        let class = wide(CLASS_NAME);
        let instance = unsafe { GetModuleHandleW(null()) };

        let mut wc: WNDCLASSEXW = unsafe { std::mem::zeroed() };
        wc.cbSize = std::mem::size_of::<WNDCLASSEXW>() as u32;
        wc.lpfnWndProc = Some(wndproc);
        wc.hInstance = instance;
        wc.lpszClassName = class.as_ptr();

        if unsafe { RegisterClassExW(&wc) } == 0 {
            let err = unsafe { GetLastError() };
            // A second context on the same module shares the class.
            if err != ERROR_CLASS_ALREADY_EXISTS {
                return Err(format!("RegisterClassExW failed ({err})"));
            }
        }

        let hwnd = unsafe {
            CreateWindowExW(
                0,
                class.as_ptr(),
                class.as_ptr(),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                0,
                0,
                null_mut(),
                null_mut(),
                instance,
                null(),
            )
        };
        if hwnd.is_null() {
            let err = unsafe { GetLastError() };
            unsafe { UnregisterClassW(class.as_ptr(), instance) };
            return Err(format!("CreateWindowExW failed ({err})"));
        }

        let mut filter: DEV_BROADCAST_DEVICEINTERFACE_W = unsafe { std::mem::zeroed() };
        filter.dbcc_size = std::mem::size_of::<DEV_BROADCAST_DEVICEINTERFACE_W>() as u32;
        filter.dbcc_devicetype = DBT_DEVTYP_DEVICEINTERFACE;
        filter.dbcc_classguid = *guid;

        let notify = unsafe {
            RegisterDeviceNotificationW(
                hwnd,
                &filter as *const DEV_BROADCAST_DEVICEINTERFACE_W as *const c_void,
                DEVICE_NOTIFY_WINDOW_HANDLE,
            )
        };
        if notify.is_null() {
            let err = unsafe { GetLastError() };
            unsafe {
                DestroyWindow(hwnd);
                UnregisterClassW(class.as_ptr(), instance);
            }
            return Err(format!("RegisterDeviceNotificationW failed ({err})"));
        }

        debug!("device notification window registered");
        Ok(Self {
            class,
            instance,
            hwnd,
            notify,
        })
    }

    /// Dispatch up to `iterations` queued messages. `true` if an arrival or removal
    /// was seen meanwhile.
    pub(super) fn pump(&self, iterations: u32) -> bool {
        let before = DEVICE_CHANGES.with(Cell::get);
        for _ in 0..iterations {
            let mut msg: MSG = unsafe { std::mem::zeroed() };
            // Sent messages are dispatched inside PeekMessageW even when it returns 0.
            if unsafe { PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE) } == 0 {
                break;
            }
            unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        DEVICE_CHANGES.with(Cell::get) != before
    }
}

impl Drop for NotifyWindow {
    fn drop(&mut self) {
        unsafe {
            UnregisterDeviceNotification(self.notify);
            DestroyWindow(self.hwnd);
            UnregisterClassW(self.class.as_ptr(), self.instance);
        }
    }
}
