//! Virtual clock and pending timers.
//!
//! Time only moves when the scheduler advances it, so sessions replay the
//! same way every run.

use hub::Intent;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Timer {
    due_ms: u64,
    seq: u64,
    intent: Intent,
}

// Ordered by due time, ties by scheduling order.
impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

/// Pending intents keyed by virtual due time.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_seq: u64,
    pending: BinaryHeap<Reverse<Timer>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedules `intent` to fire `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, intent: Intent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Reverse(Timer {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq,
            intent,
        }));
    }

    /// Pops the earliest timer due at or before `until_ms` and moves the clock to it.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Intent> {
        let due = self.pending.peek().map(|Reverse(timer)| timer.due_ms)?;
        if due > until_ms {
            return None;
        }
        let Reverse(timer) = self.pending.pop()?;
        self.now_ms = self.now_ms.max(timer.due_ms);
        Some(timer.intent)
    }

    /// Moves the clock forward to `target_ms` without firing anything.
    pub fn advance_to(&mut self, target_ms: u64) {
        self.now_ms = self.now_ms.max(target_ms);
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<u64> {
        self.pending.peek().map(|Reverse(timer)| timer.due_ms)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending timer; returns how many were cancelled.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}
