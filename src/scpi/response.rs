//! Response serialization and transmission.
//!
//! Handlers append typed values to a [`Response`]; the dispatcher hands the
//! finished unit to a [`ResponseWriter`], which sends it followed by the line
//! terminator before the next command is processed.

use core::fmt::Write;

use heapless::String;

use crate::config::RESPONSE_CAPACITY;
use crate::transport::SerialTx;

/// Terminator appended to every non-empty response.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Separator between values of one response.
const VALUE_SEPARATOR: char = ',';

/// Response did not fit the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseOverflow;

/// One command's response unit.
#[derive(Debug, Default)]
pub struct Response<const N: usize = RESPONSE_CAPACITY> {
    text: String<N>,
    values: usize,
    overflow: bool,
}

impl<const N: usize> Response<N> {
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            values: 0,
            overflow: false,
        }
    }

    fn begin_value(&mut self) {
        if self.values > 0 {
            self.push_raw_char(VALUE_SEPARATOR);
        }
        self.values += 1;
    }

    fn push_raw_char(&mut self, c: char) {
        if self.text.push(c).is_err() {
            self.overflow = true;
        }
    }

    fn push_raw(&mut self, s: &str) {
        if self.text.push_str(s).is_err() {
            self.overflow = true;
        }
    }

    /// Integer in decimal.
    pub fn push_int(&mut self, value: i64) {
        self.begin_value();
        if write!(self.text, "{}", value).is_err() {
            self.overflow = true;
        }
    }

    pub fn push_uint(&mut self, value: u64) {
        self.begin_value();
        if write!(self.text, "{}", value).is_err() {
            self.overflow = true;
        }
    }

    /// Real number, shortest round-trip form.
    pub fn push_f64(&mut self, value: f64) {
        self.begin_value();
        if write!(self.text, "{}", value).is_err() {
            self.overflow = true;
        }
    }

    /// `1` / `0`.
    pub fn push_bool(&mut self, value: bool) {
        self.push_int(i64::from(value));
    }

    /// Quoted string data; inner `"` are doubled.
    pub fn push_quoted(&mut self, value: &str) {
        self.begin_value();
        self.push_raw_char('"');
        for (i, part) in value.split('"').enumerate() {
            if i > 0 {
                self.push_raw("\"\"");
            }
            self.push_raw(part);
        }
        self.push_raw_char('"');
    }

    /// Unquoted text (arbitrary ASCII response, character data).
    pub fn push_text(&mut self, value: &str) {
        self.begin_value();
        self.push_raw(value);
    }

    /// Pre-formatted value, e.g. an error record.
    pub fn push_display<T: core::fmt::Display>(&mut self, value: &T) {
        self.begin_value();
        if write!(self.text, "{}", value).is_err() {
            self.overflow = true;
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Some value did not fit; the unit must not be sent.
    pub fn overflowed(&self) -> Result<(), ResponseOverflow> {
        if self.overflow {
            Err(ResponseOverflow)
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.values = 0;
        self.overflow = false;
    }
}

/// Writes response units to the transport.
pub struct ResponseWriter<T: SerialTx> {
    tx: T,
    sent: u32,
}

impl<T: SerialTx> ResponseWriter<T> {
    pub fn new(tx: T) -> Self {
        Self { tx, sent: 0 }
    }

    /// Send one unit plus terminator. Empty units send nothing.
    ///
    /// Blocks until the transport accepted every byte. On failure the rest
    /// of the unit is abandoned.
    pub fn send(&mut self, response: &str) -> Result<(), T::Error> {
        if response.is_empty() {
            return Ok(());
        }
        self.tx.write_all(response.as_bytes())?;
        self.tx.write_all(LINE_TERMINATOR)?;
        self.tx.flush()?;
        self.sent = self.sent.wrapping_add(1);
        Ok(())
    }

    /// Units sent since creation.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn transport(&self) -> &T {
        &self.tx
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.tx
    }

    pub fn into_inner(self) -> T {
        self.tx
    }
}
