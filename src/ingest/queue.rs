//! Bounded SPSC hand-off from the framer to the dispatcher.
//!
//! ```text
//! RX context ──push──▶ CommandQueue ──pop──▶ dispatch loop
//!                      (lock-free)
//! ```
//!
//! - One producer, one consumer, strict FIFO.
//! - An accepted line is delivered exactly once.
//! - A full queue rejects the push and hands the line back; nothing is
//!   dropped silently.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use super::framer::Line;
use crate::config::COMMAND_QUEUE_DEPTH;

/// Push rejected: the queue is full. Carries the line back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum QueueError {
    Full(Line),
}

/// Fixed-capacity line queue.
///
/// Indices run over `0..2N` so full and empty stay distinguishable for any
/// `N`, not just powers of two.
///
/// # Memory Ordering
///
/// - Producer writes the slot, then publishes `tail` with `Release`.
/// - Consumer loads `tail` with `Acquire` before reading the slot, and
///   releases the slot by publishing `head` with `Release`.
pub struct CommandQueue<const N: usize = COMMAND_QUEUE_DEPTH> {
    slots: UnsafeCell<[Line; N]>,
    /// Next slot to read (consumer-owned).
    head: AtomicUsize,
    /// Next slot to write (producer-owned).
    tail: AtomicUsize,
}

// SAFETY: single producer touches only slot[tail], single consumer only
// slot[head]; the two never alias while the queue is neither full nor empty,
// and the index handshake above orders the accesses.
unsafe impl<const N: usize> Sync for CommandQueue<N> {}
unsafe impl<const N: usize> Send for CommandQueue<N> {}

impl<const N: usize> CommandQueue<N> {
    const WRAP: usize = 2 * N;

    pub const fn new() -> Self {
        const { assert!(N > 0, "queue depth must be non-zero") };
        const EMPTY_SLOT: Line = Line::EMPTY;

        Self {
            slots: UnsafeCell::new([EMPTY_SLOT; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn advance(idx: usize) -> usize {
        if idx + 1 == Self::WRAP {
            0
        } else {
            idx + 1
        }
    }

    #[inline]
    fn distance(head: usize, tail: usize) -> usize {
        (tail + Self::WRAP - head) % Self::WRAP
    }

    /// Enqueue without waiting. Producer side only.
    pub fn try_push(&self, line: Line) -> Result<(), QueueError> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if Self::distance(head, tail) == N {
            return Err(QueueError::Full(line));
        }

        // SAFETY: slot[tail % N] is outside the consumer's window.
        unsafe {
            (*self.slots.get())[tail % N] = line;
        }

        self.tail.store(Self::advance(tail), Ordering::Release);
        Ok(())
    }

    /// Enqueue, calling `idle` between attempts while the queue is full.
    pub fn push_wait<F: FnMut()>(&self, mut line: Line, mut idle: F) {
        loop {
            match self.try_push(line) {
                Ok(()) => return,
                Err(QueueError::Full(back)) => {
                    line = back;
                    idle();
                }
            }
        }
    }

    /// Dequeue without waiting. Consumer side only.
    pub fn try_pop(&self) -> Option<Line> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        // SAFETY: slot[head % N] was published by the Acquire load of tail
        // and stays untouched by the producer until head moves past it.
        let line = unsafe { core::mem::replace(&mut (*self.slots.get())[head % N], Line::EMPTY) };

        self.head.store(Self::advance(head), Ordering::Release);
        Some(line)
    }

    /// Dequeue, calling `idle` between attempts while the queue is empty.
    pub fn pop_wait<F: FnMut()>(&self, mut idle: F) -> Line {
        loop {
            if let Some(line) = self.try_pop() {
                return line;
            }
            idle();
        }
    }

    /// Lines waiting.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        Self::distance(head, tail)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
