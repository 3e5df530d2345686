//! Global log stream instances.
//!
//! One stream per execution context, so each ring keeps a single producer.

use crate::logging::LogStream;

/// Byte-ingestion context (framer, queue producer).
///
/// Written from the RX callback only. Drained by the log task.
pub static RX_LOG_STREAM: LogStream = LogStream::new();

/// Worker context (dispatch loop, handlers, response writer).
pub static DISPATCH_LOG_STREAM: LogStream = LogStream::new();
