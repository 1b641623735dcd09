//! Change observers
//!
//! A spring reports reads and writes of its value to an optional observer so a
//! reactive layer can track dependencies and schedule recomputation. Both
//! hooks default to no-ops.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives value read/write notifications from a spring.
pub trait ChangeObserver: Send + Sync {
    /// The spring value was read.
    fn mark_read(&self) {}

    /// The spring value was written.
    fn mark_changed(&self) {}
}

/// Observer that ignores every notification
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl ChangeObserver for NoopObserver {}

/// Observer that counts notifications
#[derive(Debug, Default)]
pub struct ChangeCounter {
    reads: AtomicUsize,
    changes: AtomicUsize,
}

impl ChangeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn changes(&self) -> usize {
        self.changes.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.changes.store(0, Ordering::Relaxed);
    }
}

impl ChangeObserver for ChangeCounter {
    fn mark_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn mark_changed(&self) {
        self.changes.fetch_add(1, Ordering::Relaxed);
    }
}
