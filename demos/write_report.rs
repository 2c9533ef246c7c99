//! Open an Omniwear-style haptic device (03eb:2402) and send the reset report.
//!
//! `cargo run --example write_report [path]`; with a path argument the device is
//! opened by path instead of by id.

use hidwire::{Hid, HidConfig};
use tracing_subscriber::EnvFilter;

const VENDOR_ID: u16 = 0x03eb;
const PRODUCT_ID: u16 = 0x2402;
const RESET: [u8; 2] = [0x01, 0x11];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::var("HIDWIRE_CONFIG") {
        Ok(path) => HidConfig::load(path)?,
        Err(_) => HidConfig::default(),
    };
    let mut hid = Hid::from_config(config);

    let device = match std::env::args().nth(1) {
        Some(path) => hid.open_path(&path)?,
        None => hid.open(VENDOR_ID, PRODUCT_ID, None)?,
    };
    println!("opened {}", device.info());

    let written = hid.write(&device, 0, &RESET)?;
    println!("reset sent ({written} bytes)");

    hid.service()?;
    Ok(())
}
