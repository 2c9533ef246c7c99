//! The HID context: lifecycle, enumeration, open and I/O.
//!
//! A [`Hid`] is the explicit replacement for a process-global "HID subsystem". It
//! initializes lazily on first use, keeps a sticky failure, and releases the native
//! context when dropped. It is single-threaded by construction (`&mut self` on every
//! call that touches the native context), and on macOS/Windows the native context is
//! `!Send`, so it also stays on the thread that created it.
//!
//! # Example
//! ```no_run
//! use hidwire::Hid;
//!
//! let mut hid = Hid::new();
//! for info in hid.enumerate_all()? {
//!     println!("{info}");
//! }
//! let device = hid.open(0x03eb, 0x2402, None)?;
//! hid.write(&device, 0, &[0x01, 0x11])?;
//! # Ok::<(), hidwire::HidError>(())
//! ```

use std::ops::ControlFlow;

use tracing::{debug, trace, warn};

use crate::backend::{Backend, NativeDevice};
use crate::backends::Native;
use crate::config::HidConfig;
use crate::device::Device;
use crate::device_info::{Criteria, DeviceFilter, DeviceInfo};
use crate::error::{HidError, Result};
use crate::lifecycle::Lifecycle;

pub struct Hid<B: Backend = Native> {
    config: HidConfig,
    state: Lifecycle<B>,
}

impl Hid<Native> {
    /// A context for the platform backend with default settings.
    pub fn new() -> Self {
        Self::with_backend(HidConfig::default())
    }

    pub fn from_config(config: HidConfig) -> Self {
        Self::with_backend(config)
    }
}

impl Default for Hid<Native> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Hid<B> {
    /// A context over an explicit backend type. Nothing native happens until the
    /// first call that needs it.
    pub fn with_backend(config: HidConfig) -> Self {
        Self {
            config,
            state: Lifecycle::Uninitialized,
        }
    }

    pub fn config(&self) -> &HidConfig {
        &self.config
    }

    /// Bring the native subsystem up.
    ///
    /// Idempotent: once initialized this returns `Ok` without touching the OS. A
    /// failed initialization is sticky for the life of this context.
    pub fn init(&mut self) -> Result<()> {
        self.backend().map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    /// Tear the native subsystem down. Safe to call any number of times.
    ///
    /// Devices opened earlier stay usable; they own their native handles.
    pub fn release(&mut self) {
        if let Some(backend) = self.state.release() {
            drop(backend);
            debug!("HID subsystem released");
        }
    }

    fn backend(&mut self) -> Result<&mut B> {
        let config = &self.config;
        let was_failed = self.state.is_failed();
        let was_initialized = self.state.is_initialized();
        let result = self.state.get_or_init(|| B::init(config));
        match &result {
            Ok(_) if !was_initialized => debug!("HID subsystem initialized"),
            Err(err) if !was_failed => warn!(error = %err, "HID subsystem initialization failed"),
            _ => {}
        }
        result
    }

    /// Visit every attached device, including `0000:0000` placeholders, until `visit`
    /// breaks.
    pub fn for_each<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&DeviceInfo) -> ControlFlow<()>,
    {
        self.backend()?.for_each(|_, info| visit(info))
    }

    /// Currently attached devices matching `vendor_id`/`product_id`; `0` is a
    /// wildcard for either id. `0000:0000` placeholders are never included.
    pub fn enumerate(&mut self, vendor_id: u16, product_id: u16) -> Result<Vec<DeviceInfo>> {
        let filter = DeviceFilter::new(vendor_id, product_id);
        let mut found = Vec::new();
        self.for_each(|info| {
            if filter.matches(info) {
                found.push(info.clone());
            }
            ControlFlow::Continue(())
        })?;
        debug!(
            vendor_id = format_args!("{vendor_id:04x}"),
            product_id = format_args!("{product_id:04x}"),
            count = found.len(),
            "enumerated HID devices"
        );
        Ok(found)
    }

    pub fn enumerate_all(&mut self) -> Result<Vec<DeviceInfo>> {
        self.enumerate(0, 0)
    }

    /// Open the first attached device matching the ids and, when given, the exact
    /// serial number.
    pub fn open(
        &mut self,
        vendor_id: u16,
        product_id: u16,
        serial_number: Option<&str>,
    ) -> Result<Device<B>> {
        let mut criteria = Criteria::new(vendor_id, product_id);
        if let Some(serial) = serial_number {
            criteria = criteria.with_serial(serial);
        }
        self.open_with(&criteria)
    }

    pub fn open_with(&mut self, criteria: &Criteria) -> Result<Device<B>> {
        self.open_first(criteria.to_string(), |info| criteria.matches(info))
    }

    /// Open the device whose enumeration `path` equals `path`. An empty path never
    /// matches.
    pub fn open_path(&mut self, path: &str) -> Result<Device<B>> {
        if path.is_empty() {
            return Err(HidError::NotFound("empty path".into()));
        }
        self.open_first(format!("path {path}"), |info| info.path == path)
    }

    /// Walk the devices once and open the first one `wanted` accepts. Later matches
    /// are not tried, even if opening the first one fails.
    fn open_first<P>(&mut self, what: String, mut wanted: P) -> Result<Device<B>>
    where
        P: FnMut(&DeviceInfo) -> bool,
    {
        let backend = &*self.backend()?;
        let mut outcome = None;
        backend.for_each(|candidate, info| {
            if !wanted(info) {
                return ControlFlow::Continue(());
            }
            outcome = Some(
                backend
                    .open(candidate, info)
                    .map(|native| Device::new(native, info.clone())),
            );
            ControlFlow::Break(())
        })?;

        match outcome {
            Some(Ok(device)) => {
                debug!(device = %device.info(), "opened HID device");
                Ok(device)
            }
            Some(Err(err)) => {
                warn!(target_device = %what, error = %err, "HID device open failed");
                Err(err)
            }
            None => {
                debug!(target_device = %what, "no matching HID device");
                Err(HidError::NotFound(what))
            }
        }
    }

    /// Send one output report with `report_id` and `payload`.
    ///
    /// The returned count follows the backend's framing: interrupt-mode libusb and
    /// IOKit count payload bytes, Windows counts the full fixed-size report.
    pub fn write(&self, device: &Device<B>, report_id: u8, payload: &[u8]) -> Result<usize> {
        let written = device.native().write(report_id, payload).map_err(|err| {
            warn!(device = %device.info(), report_id, error = %err, "HID write failed");
            err
        })?;
        trace!(device = %device.info(), report_id, written, "HID write");
        Ok(written)
    }

    /// [`write`](Self::write) with report id 0, for devices without numbered reports.
    pub fn write_default(&self, device: &Device<B>, payload: &[u8]) -> Result<usize> {
        self.write(device, 0, payload)
    }

    /// Fetch one input report. Only the IOKit backend supports this.
    pub fn read(&self, device: &Device<B>, report_id: u8, buf: &mut [u8]) -> Result<usize> {
        device.native().read(report_id, buf)
    }

    /// Pump platform notifications once, bounded by the configured iteration count.
    ///
    /// Returns `true` if the pump saw activity (IOKit: a run-loop source was handled;
    /// Windows: a device arrival/removal was dispatched). Always `false` on libusb.
    pub fn service(&mut self) -> Result<bool> {
        let active = self.backend()?.service()?;
        if active {
            trace!("HID service pass handled events");
        }
        Ok(active)
    }
}

impl<B: Backend> Drop for Hid<B> {
    fn drop(&mut self) {
        self.release();
    }
}
