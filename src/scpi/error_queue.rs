//! Bounded FIFO of deferred errors.
//!
//! Overflow follows SCPI-99: the oldest records are kept, and when an error
//! arrives at a full queue the newest slot is replaced by
//! `-350,"Queue overflow"`. Later errors are discarded until the queue
//! drains.

use heapless::Deque;

use super::error::ScpiError;
use crate::config::ERROR_QUEUE_SIZE;

/// Outcome of [`ErrorQueue::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queue was full; the last slot now reads "Queue overflow".
    Overflowed,
    /// Queue was already in overflow; the error was discarded.
    Discarded,
}

pub struct ErrorQueue<const N: usize = ERROR_QUEUE_SIZE> {
    records: Deque<ScpiError, N>,
}

impl<const N: usize> ErrorQueue<N> {
    pub const fn new() -> Self {
        const { assert!(N >= 2, "error queue needs room for the overflow marker") };

        Self { records: Deque::new() }
    }

    pub fn push(&mut self, error: ScpiError) -> PushOutcome {
        if error == ScpiError::NoError {
            return PushOutcome::Discarded;
        }
        if !self.records.is_full() {
            let _ = self.records.push_back(error);
            return PushOutcome::Queued;
        }
        if self.records.back() == Some(&ScpiError::QueueOverflow) {
            return PushOutcome::Discarded;
        }
        self.records.pop_back();
        let _ = self.records.push_back(ScpiError::QueueOverflow);
        PushOutcome::Overflowed
    }

    /// Remove and return the oldest error, or `NoError` if empty.
    pub fn pop(&mut self) -> ScpiError {
        self.records.pop_front().unwrap_or(ScpiError::NoError)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for ErrorQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
