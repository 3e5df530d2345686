//! Input overrun bookkeeping shared by the RX context and the dispatcher.
//!
//! The RX context cannot touch the error queue, so it records what it lost
//! here. The dispatcher takes the pending counts before each line and turns
//! them into `-363,"Input buffer overrun"` records.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Why input was lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OverrunCode {
    /// A line exceeded the framer capacity; its tail was dropped.
    LineTooLong = 1,
    /// The command queue was full; a whole line was dropped.
    QueueFull = 2,
}

/// Lock-free overrun state (one producer, one consumer).
pub struct OverrunState {
    /// True while counts are waiting to be reported.
    pending: AtomicBool,
    /// Lines truncated since the last take.
    truncated: AtomicU32,
    /// Lines dropped since the last take.
    dropped: AtomicU32,
    /// Total events since boot (never cleared).
    total: AtomicU32,
}

impl OverrunState {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            truncated: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            total: AtomicU32::new(0),
        }
    }

    /// Record one overrun.
    #[inline]
    pub fn record(&self, code: OverrunCode) {
        match code {
            OverrunCode::LineTooLong => self.truncated.fetch_add(1, Ordering::Relaxed),
            OverrunCode::QueueFull => self.dropped.fetch_add(1, Ordering::Relaxed),
        };
        self.total.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Take pending counts, clearing them.
    #[inline]
    pub fn take(&self) -> OverrunSnapshot {
        if !self.pending.swap(false, Ordering::AcqRel) {
            return OverrunSnapshot::default();
        }
        OverrunSnapshot {
            truncated: self.truncated.swap(0, Ordering::Relaxed),
            dropped: self.dropped.swap(0, Ordering::Relaxed),
        }
    }

    /// Total overruns since boot.
    #[inline]
    pub fn total(&self) -> u32 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for OverrunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts taken from [`OverrunState`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverrunSnapshot {
    pub truncated: u32,
    pub dropped: u32,
}

impl OverrunSnapshot {
    pub fn is_empty(&self) -> bool {
        self.truncated == 0 && self.dropped == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrun_take_clears() {
        let state = OverrunState::new();
        assert!(!state.is_pending());
        assert!(state.take().is_empty());

        state.record(OverrunCode::LineTooLong);
        state.record(OverrunCode::QueueFull);
        state.record(OverrunCode::QueueFull);
        assert!(state.is_pending());

        let snap = state.take();
        assert_eq!(snap, OverrunSnapshot { truncated: 1, dropped: 2 });
        assert!(!state.is_pending());
        assert!(state.take().is_empty());
    }

    #[test]
    fn test_total_accumulates() {
        let state = OverrunState::new();
        state.record(OverrunCode::QueueFull);
        state.take();
        state.record(OverrunCode::LineTooLong);
        assert_eq!(state.total(), 2);
    }
}
