//! Error types.
//!
//! Every failure the core can report is a [`HidError`]. Nothing in the crate panics on
//! a missing device, a refused open or a timed-out transfer; callers that only care
//! about "did it work" can collapse any `Err` to their own empty/negative value.

use thiserror::Error;

/// Errors surfaced by [`Hid`](crate::Hid) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HidError {
    /// The native subsystem could not be initialized.
    ///
    /// Sticky: once returned by `init()`, every later call on the same context
    /// returns it again without retrying the native call.
    #[error("HID subsystem initialization failed: {0}")]
    Init(String),

    /// No currently attached device matched the criteria or path.
    #[error("no matching HID device: {0}")]
    NotFound(String),

    /// A device matched but the OS refused to open, seize, or claim it.
    #[error("HID device open denied: {0}")]
    Denied(String),

    /// The transfer did not complete within the configured I/O timeout.
    #[error("HID transfer timed out")]
    Timeout,

    /// The payload does not fit the device's negotiated output report.
    #[error("report payload of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },

    /// The active backend has no native primitive for this operation.
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),

    /// Any other native failure.
    #[error("native HID error: {0}")]
    Native(String),
}

/// Errors raised while loading a [`HidConfig`](crate::HidConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized config format: {0}")]
    UnknownFormat(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T, E = HidError> = std::result::Result<T, E>;
