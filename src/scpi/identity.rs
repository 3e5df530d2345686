//! Instrument identity reported by `*IDN?`.

use core::fmt;

use heapless::String;

use crate::config;
use crate::transport::DeviceId;

/// Largest hardware id accepted, in bytes.
pub const MAX_ID_BYTES: usize = 16;

/// Serial reported when the hardware has no unique id.
pub const UNKNOWN_SERIAL: &str = "UNKNOWN";

/// Immutable for the process lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub serial: String<{ MAX_ID_BYTES * 2 }>,
    pub firmware: &'static str,
}

impl Identity {
    pub fn new(
        manufacturer: &'static str,
        model: &'static str,
        serial: &str,
        firmware: &'static str,
    ) -> Self {
        let mut s = String::new();
        for c in serial.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        Self {
            manufacturer,
            model,
            serial: s,
            firmware,
        }
    }

    /// Build-time manufacturer/model/firmware plus the serial read from
    /// `device`.
    pub fn from_device<D: DeviceId>(device: &mut D) -> Self {
        let serial = serial_from_device(device);
        Self::new(config::MANUFACTURER, config::MODEL, &serial, config::FIRMWARE_VERSION)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.manufacturer, self.model, self.serial, self.firmware)
    }
}

/// Hex-encode (upper case) the hardware id, or `UNKNOWN`.
pub fn serial_from_device<D: DeviceId>(device: &mut D) -> String<{ MAX_ID_BYTES * 2 }> {
    let mut id = [0u8; MAX_ID_BYTES];
    let mut serial = String::new();

    let len = match device.unique_id(&mut id) {
        Some(n) if n > 0 => n.min(MAX_ID_BYTES),
        _ => {
            let _ = serial.push_str(UNKNOWN_SERIAL);
            return serial;
        }
    };

    let mut hex_buf = [0u8; MAX_ID_BYTES * 2];
    let out = &mut hex_buf[..len * 2];
    if hex::encode_to_slice(&id[..len], out).is_err() {
        let _ = serial.push_str(UNKNOWN_SERIAL);
        return serial;
    }
    out.make_ascii_uppercase();

    // hex output is ASCII
    if let Ok(text) = core::str::from_utf8(out) {
        let _ = serial.push_str(text);
    }
    serial
}
