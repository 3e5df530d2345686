//! Byte stream → line framing.
//!
//! Runs in the RX context: fixed buffer, no allocation, no blocking.

use heapless::Vec;

use crate::config::INPUT_BUFFER_LENGTH;

/// One complete command line.
///
/// Never empty, never contains `\r` or `\n`. `truncated` marks a line whose
/// tail was dropped because it exceeded the framer capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8, INPUT_BUFFER_LENGTH>,
    truncated: bool,
}

impl Line {
    /// Placeholder for pre-allocated queue slots. Never handed to the
    /// dispatcher.
    pub(crate) const EMPTY: Line = Line {
        bytes: Vec::new(),
        truncated: false,
    };

    /// Build a line from text. Returns `None` for empty text, text holding a
    /// terminator, or text longer than the framer could have produced.
    pub fn new(text: &str) -> Option<Self> {
        if text.is_empty()
            || text.len() >= INPUT_BUFFER_LENGTH
            || text.bytes().any(|b| b == b'\r' || b == b'\n')
        {
            return None;
        }
        let bytes = Vec::from_slice(text.as_bytes()).ok()?;
        Some(Self { bytes, truncated: false })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Line as text, or `None` if it holds non-UTF-8 bytes.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Result of feeding one byte.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameEvent {
    /// Byte buffered (or an empty-line terminator discarded).
    Pending,
    /// Terminator closed a non-empty line.
    Line(Line),
    /// Buffer full; byte dropped. Buffer keeps its content until the next
    /// terminator. `dropped` counts bytes lost from the current line.
    Overflow { dropped: usize },
}

/// Line accumulator.
///
/// `CAP` includes one reserved slot, so lines hold at most `CAP - 1` bytes.
pub struct LineFramer<const CAP: usize = INPUT_BUFFER_LENGTH> {
    buf: [u8; CAP],
    len: usize,
    dropped: usize,
}

impl<const CAP: usize> LineFramer<CAP> {
    pub const fn new() -> Self {
        const { assert!(CAP >= 2 && CAP <= INPUT_BUFFER_LENGTH, "framer capacity out of range") };

        Self {
            buf: [0u8; CAP],
            len: 0,
            dropped: 0,
        }
    }

    /// Feed one received byte.
    pub fn feed(&mut self, byte: u8) -> FrameEvent {
        match byte {
            b'\r' | b'\n' => {
                if self.len == 0 {
                    return FrameEvent::Pending;
                }
                FrameEvent::Line(self.take_line())
            }
            _ => {
                if self.len >= CAP - 1 {
                    self.dropped += 1;
                    return FrameEvent::Overflow { dropped: self.dropped };
                }
                self.buf[self.len] = byte;
                self.len += 1;
                FrameEvent::Pending
            }
        }
    }

    fn take_line(&mut self) -> Line {
        let mut bytes = Vec::new();
        // CAP - 1 <= INPUT_BUFFER_LENGTH, checked in new()
        let _ = bytes.extend_from_slice(&self.buf[..self.len]);
        let line = Line {
            bytes,
            truncated: self.dropped > 0,
        };
        self.clear();
        line
    }

    /// Discard the partial line.
    pub fn clear(&mut self) {
        self.len = 0;
        self.dropped = 0;
    }

    /// Bytes buffered for the current line.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest line this framer can emit.
    pub const fn max_line_len(&self) -> usize {
        CAP - 1
    }
}

impl<const CAP: usize> Default for LineFramer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
