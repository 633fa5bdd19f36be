use std::collections::VecDeque;

use hub::IntentPriority;

const PRIORITIES: [IntentPriority; 3] = [IntentPriority::P0, IntentPriority::P1, IntentPriority::P2];

/// Fixed set of FIFO queues ordered P0 ≻ P1 ≻ P2.
#[derive(Debug)]
pub struct PQueues<T> {
    buckets: [VecDeque<T>; 3],
}

impl<T> Default for PQueues<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T> PQueues<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates empty queues with an initial capacity per priority bucket.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: std::array::from_fn(|_| VecDeque::with_capacity(capacity)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(VecDeque::is_empty)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(VecDeque::len).sum()
    }

    /// Items per bucket, ordered `[P0, P1, P2]`.
    pub fn len_per_priority(&self) -> [usize; 3] {
        [
            self.buckets[0].len(),
            self.buckets[1].len(),
            self.buckets[2].len(),
        ]
    }

    pub fn enqueue(&mut self, priority: IntentPriority, item: T) {
        self.buckets[priority.index()].push_back(item);
    }

    /// Pops the oldest item of the highest non-empty priority.
    pub fn pop_next(&mut self) -> Option<T> {
        let priority = self.current_priority()?;
        self.buckets[priority.index()].pop_front()
    }

    /// Highest priority that currently has items.
    pub fn current_priority(&self) -> Option<IntentPriority> {
        PRIORITIES
            .into_iter()
            .find(|priority| !self.buckets[priority.index()].is_empty())
    }
}
