//! Runtime configuration.
//!
//! [`HidConfig`] carries the handful of knobs the backends need: the fixed I/O
//! timeout, how long a single [`Hid::service`](crate::Hid::service) pump may run,
//! and the libusb interface/endpoint/framing used for writes. Every field has a
//! default, so partial files are fine.
//!
//! # Example
//! ```
//! use hidwire::{HidConfig, WriteMode};
//!
//! let cfg = HidConfig::from_toml_str(r#"
//!     io_timeout_ms = 2500
//!     write_mode = "control"
//! "#).unwrap();
//! assert_eq!(cfg.io_timeout_ms, 2500);
//! assert_eq!(cfg.write_mode, WriteMode::Control);
//! assert_eq!(cfg.out_endpoint, 0x02);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default blocking limit for a single report transfer.
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 10_000;

/// How the libusb backend frames an output report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Payload goes to the OUT endpoint unchanged; the report id is not sent.
    #[default]
    Interrupt,
    /// `[report_id] ++ payload` as a class SET_REPORT control request.
    ///
    /// For devices without a usable interrupt OUT endpoint.
    Control,
}

/// Backend tuning shared by every [`Hid`](crate::Hid) operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HidConfig {
    /// Upper bound for one blocking write/read, in milliseconds.
    pub io_timeout_ms: u64,

    /// Maximum number of pump iterations per `service()` call.
    pub service_iterations: u32,

    /// Run-loop slice per iteration (IOKit only), in milliseconds.
    pub service_slice_ms: u64,

    /// USB interface claimed on open (libusb only).
    pub interface: u8,

    /// Interrupt OUT endpoint address (libusb only).
    pub out_endpoint: u8,

    /// Output report framing (libusb only).
    pub write_mode: WriteMode,

    /// Try to detach a bound kernel driver before claiming (libusb only).
    ///
    /// Failure to detach is never fatal; the claim decides.
    pub detach_kernel_driver: bool,
}

impl Default for HidConfig {
    fn default() -> Self {
        Self {
            io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
            service_iterations: 10,
            service_slice_ms: 1,
            interface: 0,
            out_endpoint: 0x02,
            write_mode: WriteMode::Interrupt,
            detach_kernel_driver: true,
        }
    }
}

impl HidConfig {
    #[inline]
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    #[inline]
    pub fn service_slice(&self) -> Duration {
        Duration::from_millis(self.service_slice_ms)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the backends cannot honor.
    ///
    /// A zero I/O timeout means "wait forever" to libusb and "never wait" to
    /// `WaitForSingleObject`, so it is refused outright.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_timeout_ms == 0 {
            return Err(ConfigError::Invalid("io_timeout_ms must be greater than 0".into()));
        }
        Ok(())
    }

    /// Load a config file, picking the parser from the extension (`.toml` / `.json`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(ConfigError::UnknownFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let cfg = HidConfig::default();
        assert_eq!(cfg.io_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.service_iterations, 10);
        assert_eq!(cfg.interface, 0);
        assert_eq!(cfg.out_endpoint, 0x02);
        assert_eq!(cfg.write_mode, WriteMode::Interrupt);
        assert!(cfg.detach_kernel_driver);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(HidConfig::from_toml_str("").unwrap(), HidConfig::default());
    }

    #[test]
    fn json_overrides_selected_fields() {
        let cfg = HidConfig::from_json_str(r#"{ "out_endpoint": 1, "detach_kernel_driver": false }"#)
            .unwrap();
        assert_eq!(cfg.out_endpoint, 1);
        assert!(!cfg.detach_kernel_driver);
        assert_eq!(cfg.io_timeout_ms, DEFAULT_IO_TIMEOUT_MS);
    }

    #[test]
    fn bad_write_mode_is_rejected() {
        let err = HidConfig::from_toml_str("write_mode = \"bulk\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = HidConfig::from_toml_str("io_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = HidConfig::from_json_str(r#"{ "io_timeout_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let cfg = HidConfig {
            io_timeout_ms: 0,
            ..HidConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(HidConfig::default().validate().is_ok());
    }

    #[test]
    fn load_rejects_zero_timeout_file() {
        let path = std::env::temp_dir().join(format!("hidwire-zero-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "io_timeout_ms": 0 }"#).unwrap();
        let err = HidConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("hidwire-cfg-{}.toml", std::process::id()));
        std::fs::write(&path, "service_iterations = 3\n").unwrap();
        let cfg = HidConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.service_iterations, 3);

        let odd = dir.join(format!("hidwire-cfg-{}.ini", std::process::id()));
        std::fs::write(&odd, "").unwrap();
        let err = HidConfig::load(&odd).unwrap_err();
        std::fs::remove_file(&odd).ok();
        assert!(matches!(err, ConfigError::UnknownFormat(ext) if ext == "ini"));
    }
}
