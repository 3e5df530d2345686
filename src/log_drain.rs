//! Log drain: empties the RT-safe log streams into a text sink.
//!
//! Runs in its own low-priority context, so writing to the sink may block.
//! The sink is a dedicated log port (UART TX on the board, stderr on the
//! host) and never the SCPI response channel.

use core::fmt::Write;

use crate::logging::{LogEntry, LogStream};

/// Formatted line capacity.
pub const LINE_BUFFER_SIZE: usize = 160;

/// Dropped-message report period.
pub const DROPPED_REPORT_INTERVAL_US: i64 = 10_000_000;

/// Startup banner written once before the first log line.
pub const BANNER: &str = "========== OpenAWG ==========\r\nWelcome to OpenAWG\r\n";

/// Format: `[timestamp_us] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    crate::logging::format_to_buffer(
        buf,
        format_args!(
            "[{:10}] {}: {}\n",
            entry.timestamp_us,
            entry.level.as_str(),
            entry.message()
        ),
    )
}

/// A stream plus the tag it is reported under.
pub struct Source<'a> {
    pub name: &'a str,
    pub stream: &'a LogStream,
}

/// Drain state: when drops were last reported.
pub struct LogDrain {
    last_dropped_report: i64,
    written: u32,
}

impl LogDrain {
    pub const fn new() -> Self {
        Self {
            last_dropped_report: 0,
            written: 0,
        }
    }

    /// Write the startup banner.
    pub fn banner<W: Write>(&mut self, out: &mut W) {
        let _ = out.write_str(BANNER);
    }

    /// Empty every source in order, then report drops if the interval has
    /// passed. Returns `true` if anything was written.
    pub fn drain_once<W: Write>(&mut self, sources: &[Source<'_>], out: &mut W, now_us: i64) -> bool {
        let mut buf = [0u8; LINE_BUFFER_SIZE];
        let mut work_done = false;

        for source in sources {
            while let Some(entry) = source.stream.drain() {
                let len = format_log_entry(&entry, &mut buf);
                // Truncation at the buffer end may split a code point
                let text = match core::str::from_utf8(&buf[..len]) {
                    Ok(text) => text,
                    Err(e) => core::str::from_utf8(&buf[..e.valid_up_to()]).unwrap_or(""),
                };
                let _ = out.write_str(text);
                self.written = self.written.wrapping_add(1);
                work_done = true;
            }
        }

        if now_us - self.last_dropped_report >= DROPPED_REPORT_INTERVAL_US {
            self.report_dropped(sources, out);
            self.last_dropped_report = now_us;
        }

        work_done
    }

    fn report_dropped<W: Write>(&mut self, sources: &[Source<'_>], out: &mut W) {
        for source in sources {
            let dropped = source.stream.take_dropped();
            if dropped > 0 {
                let _ = writeln!(out, "[WARN] Dropped: {}={}", source.name, dropped);
            }
        }
    }

    /// Entries written since start.
    pub fn written(&self) -> u32 {
        self.written
    }
}

impl Default for LogDrain {
    fn default() -> Self {
        Self::new()
    }
}

/// The two global streams, RX context first.
pub fn global_sources() -> [Source<'static>; 2] {
    [
        Source {
            name: "RX",
            stream: &crate::log_globals::RX_LOG_STREAM,
        },
        Source {
            name: "DISPATCH",
            stream: &crate::log_globals::DISPATCH_LOG_STREAM,
        },
    ]
}

/// Log task body: drain the global streams forever.
///
/// `idle` runs when a pass found nothing to write.
pub fn run<W: Write, C: FnMut() -> i64, F: FnMut()>(out: &mut W, mut clock: C, mut idle: F) -> ! {
    let mut drain = LogDrain::new();
    let sources = global_sources();
    drain.banner(out);
    loop {
        if !drain.drain_once(&sources, out, clock()) {
            idle();
        }
    }
}
