//! Scripted in-memory backend for exercising `Hid` without hardware.
//!
//! State lives in a thread-local so each test (one thread per test) gets its own
//! script and counters.
#![allow(dead_code)]

use std::cell::RefCell;
use std::ops::ControlFlow;

use hidwire::report::fixed_output_report;
use hidwire::{Backend, DeviceInfo, HidConfig, HidError, NativeDevice, Result};

#[derive(Default)]
pub struct Script {
    pub devices: Vec<DeviceInfo>,
    pub init_error: Option<String>,
    /// Paths whose open is refused, as a claim/seize failure would be.
    pub deny_open: Vec<String>,
    pub service_active: bool,

    pub init_calls: u32,
    pub enumerate_calls: u32,
    pub open_calls: u32,
    pub backend_drops: u32,
    pub device_drops: u32,
    pub writes: Vec<(String, u8, Vec<u8>)>,
    pub last_config: Option<HidConfig>,
}

thread_local! {
    static SCRIPT: RefCell<Script> = RefCell::new(Script::default());
}

pub fn reset(script: Script) {
    SCRIPT.with(|s| *s.borrow_mut() = script);
}

pub fn with<R>(f: impl FnOnce(&mut Script) -> R) -> R {
    SCRIPT.with(|s| f(&mut s.borrow_mut()))
}

pub fn device(vendor_id: u16, product_id: u16, path: &str, serial: &str) -> DeviceInfo {
    DeviceInfo {
        vendor_id,
        product_id,
        path: path.into(),
        serial_number: serial.into(),
        ..Default::default()
    }
}

pub struct Scripted;

impl Backend for Scripted {
    type Candidate = usize;
    type Device = ScriptedDevice;

    fn init(config: &HidConfig) -> Result<Self> {
        with(|s| {
            s.init_calls += 1;
            s.last_config = Some(config.clone());
            match &s.init_error {
                Some(reason) => Err(HidError::Init(reason.clone())),
                None => Ok(Scripted),
            }
        })
    }

    fn for_each<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&usize, &DeviceInfo) -> ControlFlow<()>,
    {
        let devices = with(|s| {
            s.enumerate_calls += 1;
            s.devices.clone()
        });
        for (index, info) in devices.iter().enumerate() {
            if visit(&index, info).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn open(&self, _candidate: &usize, info: &DeviceInfo) -> Result<ScriptedDevice> {
        with(|s| {
            s.open_calls += 1;
            if s.deny_open.contains(&info.path) {
                return Err(HidError::Denied(format!("{info}: claim refused")));
            }
            Ok(ScriptedDevice {
                path: info.path.clone(),
                report_len: info.max_output_report_len,
            })
        })
    }

    fn service(&mut self) -> Result<bool> {
        Ok(with(|s| s.service_active))
    }
}

impl Drop for Scripted {
    fn drop(&mut self) {
        with(|s| s.backend_drops += 1);
    }
}

/// Interrupt-style when `report_len` is `None`, fixed-report style otherwise.
pub struct ScriptedDevice {
    path: String,
    report_len: Option<u16>,
}

impl NativeDevice for ScriptedDevice {
    fn write(&self, report_id: u8, payload: &[u8]) -> Result<usize> {
        let written = match self.report_len {
            Some(len) => fixed_output_report(usize::from(len), report_id, payload)?.len(),
            None => payload.len(),
        };
        with(|s| s.writes.push((self.path.clone(), report_id, payload.to_vec())));
        Ok(written)
    }
}

impl Drop for ScriptedDevice {
    fn drop(&mut self) {
        with(|s| s.device_drops += 1);
    }
}
