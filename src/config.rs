//! Module: config
//!
//! Purpose: Build-time identity and sizing for the OpenAWG SCPI front end.
//!
//! Identity strings come from `build.rs` (`AWG_MANUFACTURER`, `AWG_MODEL`,
//! `AWG_FIRMWARE_VERSION`). Everything else is a compile-time constant so the
//! ingestion path never allocates.

/// Manufacturer field of `*IDN?`.
pub const MANUFACTURER: &str = env!("AWG_MANUFACTURER");

/// Model field of `*IDN?`.
pub const MODEL: &str = env!("AWG_MODEL");

/// Firmware field of `*IDN?` (crate version plus git hash when available).
pub const FIRMWARE_VERSION: &str = env!("AWG_FIRMWARE_VERSION");

/// Line buffer capacity in bytes, including the reserved terminator slot.
pub const INPUT_BUFFER_LENGTH: usize = 256;

/// Depth of the deferred error queue.
pub const ERROR_QUEUE_SIZE: usize = 16;

/// Depth of the framer → dispatcher hand-off queue.
pub const COMMAND_QUEUE_DEPTH: usize = 10;

/// Maximum bytes of one serialized response (terminator excluded).
pub const RESPONSE_CAPACITY: usize = 256;

/// Maximum hierarchy nodes in a pattern or in an input header.
pub const MAX_NODES: usize = 8;

/// Maximum entries in a command table.
pub const MAX_COMMANDS: usize = 48;

/// Stack size of the dispatch task.
pub const SERVER_STACK_SIZE: usize = 8192;

/// Priority of the dispatch task (FreeRTOS numbering).
pub const SERVER_TASK_PRIORITY: u8 = 5;

/// Monotonic microsecond clock used to stamp log entries.
pub type Clock = fn() -> i64;

/// Clock for contexts without a timer (tests, early boot).
pub fn no_clock() -> i64 {
    0
}

/// What the producer does when the command queue is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaturationPolicy {
    /// Spin until the dispatcher frees a slot. Only valid when the byte
    /// context is a cooperative task, not a preemptive ISR.
    #[default]
    Block,
    /// Drop the line and record an input overrun for the dispatcher to report.
    DropAndReport,
}

/// Runtime server options.
#[derive(Clone, Copy, Debug)]
pub struct ServerConfig {
    pub saturation: SaturationPolicy,
    pub clock: Clock,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            saturation: SaturationPolicy::Block,
            clock: no_clock,
        }
    }
}
