//! # hidwire
//!
//! Threadless, cross-platform USB HID access for talking to one device at a time:
//! enumerate attached devices, open one by vendor/product (and optionally serial) or
//! by a previously enumerated path, and send or fetch reports. A protocol layer for a
//! specific device sits on top of this crate and never sees platform types.
//!
//! ## Backends
//! Exactly one is compiled in per target:
//! - **Linux / other Unix**: libusb via `rusb`
//! - **macOS**: IOKit `IOHIDManager`
//! - **Windows**: SetupAPI + the HID class driver
//!
//! ## Model
//! - [`Hid`] is the explicit subsystem context. It initializes on first use, keeps a
//!   sticky init failure, and releases the native context on drop.
//! - [`DeviceInfo`] is a plain snapshot; nothing is cached between enumerations.
//! - [`Device`] owns one open native handle and releases it exactly once on drop.
//! - Every failure is a [`HidError`]; nothing panics on absent devices or timeouts.
//!
//! Logging goes through `tracing`; install any subscriber to see it.

mod backend;
mod backends;
pub mod config;
mod device;
pub mod device_info;
pub mod error;
mod lifecycle;
mod manager;
pub mod path;
pub mod report;

pub use backend::{Backend, NativeDevice};
pub use backends::Native;
pub use config::{HidConfig, WriteMode, DEFAULT_IO_TIMEOUT_MS};
pub use device::Device;
pub use device_info::{Criteria, DeviceFilter, DeviceInfo};
pub use error::{ConfigError, HidError, Result};
pub use manager::Hid;
