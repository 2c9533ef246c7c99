//! List every attached HID device as JSON.
//!
//! `RUST_LOG=hidwire=debug cargo run --example diagnose [vid pid]`

use hidwire::Hid;
use tracing_subscriber::EnvFilter;

fn parse_hex(arg: Option<String>) -> u16 {
    arg.and_then(|s| u16::from_str_radix(s.trim_start_matches("0x"), 16).ok())
        .unwrap_or(0)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let vendor_id = parse_hex(args.next());
    let product_id = parse_hex(args.next());

    let mut hid = Hid::new();
    match hid.enumerate(vendor_id, product_id) {
        Ok(devices) => {
            tracing::info!(count = devices.len(), "HID devices");
            match serde_json::to_string_pretty(&devices) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("serialize failed: {e}"),
            }
        }
        Err(e) => {
            eprintln!("enumeration failed: {e}");
            std::process::exit(1);
        }
    }

    match hid.service() {
        Ok(active) => tracing::debug!(active, "service pass"),
        Err(e) => tracing::warn!(error = %e, "service failed"),
    }
}
