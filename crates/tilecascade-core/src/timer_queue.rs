#![forbid(unsafe_code)]

//! Virtual-time timer queue.
//!
//! [`TimerQueue`] holds deferred payloads keyed by a deadline on a virtual
//! clock. Nothing fires by itself: the owner moves the clock forward with
//! [`TimerQueue::advance_to`] and drains due payloads with
//! [`TimerQueue::pop_due`]. Tests therefore control time exactly, and a host
//! maps wall-clock frame deltas onto the same API.
//!
//! # Invariants
//!
//! 1. The clock never moves backwards.
//! 2. Due payloads pop in deadline order; equal deadlines pop in scheduling
//!    order.
//! 3. `len()` counts scheduled payloads that have not popped.
//!
//! # Failure Modes
//!
//! - Scheduling with a delay that would overflow saturates at `Duration::MAX`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug)]
struct Entry<T> {
    deadline: Duration,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed so the max-heap yields the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Deterministic queue of deferred payloads on a virtual clock.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    next_seq: u64,
    heap: BinaryHeap<Entry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Create an empty queue with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of pending payloads.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Schedule `payload` to become due `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            deadline: self.now.saturating_add(delay),
            seq,
            payload,
        });
    }

    /// Deadline of the earliest pending payload.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.peek().map(|entry| entry.deadline)
    }

    /// Move the clock to `time`. Earlier times are ignored.
    pub fn advance_to(&mut self, time: Duration) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Pop the earliest payload whose deadline is at or before now.
    pub fn pop_due(&mut self) -> Option<T> {
        if self.heap.peek()?.deadline > self.now {
            return None;
        }
        self.heap.pop().map(|entry| entry.payload)
    }

    /// Drop every pending payload. The clock is left untouched.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
