//! Platform backends for `hidwire`.
//!
//! Exactly one backend is compiled per target and exported as [`Native`]:
//! - **libusb** (`rusb`) on Linux and the other non-Apple Unixes
//! - **IOKit** `IOHIDManager` on macOS
//! - **SetupAPI + HID** on Windows
//!
//! Backend-specific types never leak past this module other than through the
//! [`Backend`](crate::Backend) associated types.

#[cfg(not(any(unix, windows)))]
compile_error!("hidwire supports Linux/Unix (libusb), macOS (IOKit) and Windows only");

#[cfg(all(unix, not(target_os = "macos")))]
#[cfg_attr(docsrs, doc(cfg(all(unix, not(target_os = "macos")))))]
mod libusb;
#[cfg(all(unix, not(target_os = "macos")))]
pub use libusb::LibUsb as Native;

#[cfg(target_os = "macos")]
#[cfg_attr(docsrs, doc(cfg(target_os = "macos")))]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::HidManager as Native;

#[cfg(target_os = "windows")]
#[cfg_attr(docsrs, doc(cfg(target_os = "windows")))]
mod windows;
#[cfg(target_os = "windows")]
pub use windows::WinHid as Native;
