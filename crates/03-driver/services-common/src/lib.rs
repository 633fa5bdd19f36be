#![deny(missing_docs)]
//! Shared helpers for queue-backed collaborator services.
//!
//! The art, narration, and haptics adapters behave similarly when their report
//! queues reach capacity. This crate centralises the common flow so the
//! concrete services focus on policies and report construction.

use parking_lot::Mutex;
use service_abi::{SubmitOutcome, SubmitPolicy};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// Bounded report queue owned by a single service.
///
/// The scheduler drives services from one thread; the mutex only exists so
/// services can live behind `Arc<dyn Service + Send + Sync>`.
pub struct LocalQueue<T> {
    inner: Mutex<VecDeque<T>>,
    closed: AtomicBool,
}

impl<T> LocalQueue<T> {
    /// Creates a new queue with the requested capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            closed: AtomicBool::new(false),
        }
    }

    /// Grants temporary mutable access to the underlying deque.
    #[inline]
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut VecDeque<T>) -> R) -> R {
        let mut deque = self.inner.lock();
        f(&mut deque)
    }

    /// Number of queued reports.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` when no report is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Refuses every later submission. Reports already queued stay drainable.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Returns `true` once [`LocalQueue::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Attempts to push reports into a bounded queue following the provided policy.
///
/// `materialise` runs only once the policy admitted the submission, so
/// collaborator backends are never invoked for work that gets rejected.
pub fn try_submit_queue<Rep, F>(
    queue: &LocalQueue<Rep>,
    capacity: usize,
    policy: SubmitPolicy,
    needed: usize,
    materialise: F,
) -> SubmitOutcome
where
    Rep: Send + 'static,
    F: FnOnce() -> SmallVec<[Rep; 8]>,
{
    if queue.is_closed() {
        return SubmitOutcome::Closed;
    }
    queue.with_mut(|inner| {
        match policy {
            SubmitPolicy::BestEffort => {
                if inner.len() + needed > capacity {
                    return SubmitOutcome::Dropped;
                }
            }
            SubmitPolicy::Must => {
                if inner.len() + needed > capacity {
                    return SubmitOutcome::WouldBlock;
                }
            }
        }

        inner.extend(materialise());
        SubmitOutcome::Accepted
    })
}

/// Drains up to `max` reports from the queue.
pub fn drain_queue<Rep>(queue: &LocalQueue<Rep>, max: usize) -> SmallVec<[Rep; 8]>
where
    Rep: Send + 'static,
{
    if max == 0 {
        return SmallVec::new();
    }

    queue.with_mut(|inner| {
        let limit = max.min(inner.len());
        inner.drain(..limit).collect()
    })
}
