//! Capabilities the SCPI front end consumes from the board.
//!
//! The receive half is used from the ingestion context, the transmit half
//! from the worker. Keeping them as separate traits lets each context own
//! its half of the port.

/// Receive half of the serial transport.
pub trait SerialRx {
    /// Next received byte, or `None` if nothing is pending. Never blocks.
    fn read_byte(&mut self) -> Option<u8>;

    /// Arm the receive interrupt/callback. Called once before ingestion starts.
    fn enable_rx_interrupt(&mut self) {}
}

/// Transmit half of the serial transport.
pub trait SerialTx {
    type Error: core::fmt::Debug;

    /// Write one byte, blocking until the transport accepts it.
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Write a whole slice. Stops at the first failure.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &b in bytes {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// Wait until queued bytes have left the transport.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Hardware unique-id source for the serial number.
pub trait DeviceId {
    /// Fill `buf` with the device id. Returns the number of bytes written,
    /// or `None` if the hardware has no id.
    fn unique_id(&mut self, buf: &mut [u8]) -> Option<usize>;
}

/// Byte-slice receive source, handy for replaying captured traffic.
pub struct SliceRx<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceRx<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

impl SerialRx for SliceRx<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }
}
