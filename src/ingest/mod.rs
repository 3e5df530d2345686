//! Byte ingestion: RX callback → line framer → command queue.
//!
//! Runs in the RX context. No allocation, no logging that can block, and the
//! only shared state it touches is the [`CommandQueue`] and the
//! [`OverrunState`].

pub mod framer;
pub mod overrun;
pub mod queue;

pub use framer::{FrameEvent, Line, LineFramer};
pub use overrun::{OverrunCode, OverrunSnapshot, OverrunState};
pub use queue::{CommandQueue, QueueError};

use crate::config::{Clock, SaturationPolicy, INPUT_BUFFER_LENGTH};
use crate::log_globals::RX_LOG_STREAM;
use crate::transport::SerialRx;
use crate::{rt_trace, rt_warn};

/// RX-side state: the framer plus the saturation policy.
pub struct Ingest<const CAP: usize = INPUT_BUFFER_LENGTH> {
    framer: LineFramer<CAP>,
    policy: SaturationPolicy,
    clock: Clock,
    lines: u32,
}

impl<const CAP: usize> Ingest<CAP> {
    pub const fn new(policy: SaturationPolicy, clock: Clock) -> Self {
        Self {
            framer: LineFramer::new(),
            policy,
            clock,
            lines: 0,
        }
    }

    /// Arm the transport before the first callback.
    pub fn start<R: SerialRx>(&mut self, rx: &mut R) {
        self.framer.clear();
        rx.enable_rx_interrupt();
    }

    /// RX callback body: drain every pending byte from `rx`.
    ///
    /// Returns the number of lines handed to `queue`.
    pub fn on_rx<R: SerialRx, const N: usize>(
        &mut self,
        rx: &mut R,
        queue: &CommandQueue<N>,
        overrun: &OverrunState,
    ) -> usize {
        let mut handed_off = 0;
        while let Some(byte) = rx.read_byte() {
            if self.on_byte(byte, queue, overrun) {
                handed_off += 1;
            }
        }
        handed_off
    }

    /// Process one byte. Returns `true` if a line was enqueued.
    pub fn on_byte<const N: usize>(
        &mut self,
        byte: u8,
        queue: &CommandQueue<N>,
        overrun: &OverrunState,
    ) -> bool {
        match self.framer.feed(byte) {
            FrameEvent::Pending => false,
            FrameEvent::Overflow { dropped } => {
                // Once per line, not once per dropped byte
                if dropped == 1 {
                    rt_warn!(
                        RX_LOG_STREAM,
                        (self.clock)(),
                        "line exceeds {} bytes, dropping tail",
                        self.framer.max_line_len()
                    );
                }
                false
            }
            FrameEvent::Line(line) => {
                if line.is_truncated() {
                    overrun.record(OverrunCode::LineTooLong);
                }
                self.hand_off(line, queue, overrun)
            }
        }
    }

    fn hand_off<const N: usize>(
        &mut self,
        line: Line,
        queue: &CommandQueue<N>,
        overrun: &OverrunState,
    ) -> bool {
        self.lines = self.lines.wrapping_add(1);
        rt_trace!(RX_LOG_STREAM, (self.clock)(), "line {} ({} bytes)", self.lines, line.len());

        match self.policy {
            SaturationPolicy::Block => {
                queue.push_wait(line, core::hint::spin_loop);
                true
            }
            SaturationPolicy::DropAndReport => match queue.try_push(line) {
                Ok(()) => true,
                Err(QueueError::Full(dropped)) => {
                    overrun.record(OverrunCode::QueueFull);
                    rt_warn!(
                        RX_LOG_STREAM,
                        (self.clock)(),
                        "command queue full, dropped {} byte line",
                        dropped.len()
                    );
                    false
                }
            },
        }
    }

    /// Lines completed since start.
    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn policy(&self) -> SaturationPolicy {
        self.policy
    }
}
