//! Guard statistics.
//!
//! Counters are atomic and may be read while operations are in flight.

use crate::state::Operation;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-guard counters.
#[derive(Debug, Default)]
pub struct GuardStats {
    creates: AtomicU64,
    updates: AtomicU64,
    forces: AtomicU64,
    closes: AtomicU64,
    drops: AtomicU64,
    /// Total change records in forwarded update batches.
    update_records: AtomicU64,
    illegal_state_rejections: AtomicU64,
    in_progress_rejections: AtomicU64,
    resource_failures: AtomicU64,
}

impl GuardStats {
    /// Creates a zeroed stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call that passed the contract checks and reached the index.
    pub(crate) fn record_forwarded(&self, operation: Operation) {
        let counter = match operation {
            Operation::Create => &self.creates,
            Operation::Update => &self.updates,
            Operation::Force => &self.forces,
            Operation::Close => &self.closes,
            Operation::Drop => &self.drops,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_update_records(&self, count: usize) {
        self.update_records.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_illegal_state(&self) {
        self.illegal_state_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_in_progress(&self) {
        self.in_progress_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resource_failure(&self) {
        self.resource_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns how many calls of `operation` were forwarded to the index.
    pub fn forwarded(&self, operation: Operation) -> u64 {
        let counter = match operation {
            Operation::Create => &self.creates,
            Operation::Update => &self.updates,
            Operation::Force => &self.forces,
            Operation::Close => &self.closes,
            Operation::Drop => &self.drops,
        };
        counter.load(Ordering::Relaxed)
    }

    /// Returns the number of calls rejected for being illegal in the current state.
    pub fn illegal_state_rejections(&self) -> u64 {
        self.illegal_state_rejections.load(Ordering::Relaxed)
    }

    /// Returns the number of calls rejected because the gate was held.
    pub fn in_progress_rejections(&self) -> u64 {
        self.in_progress_rejections.load(Ordering::Relaxed)
    }

    /// Returns the number of forwarded calls that failed inside the index.
    pub fn resource_failures(&self) -> u64 {
        self.resource_failures.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> GuardStatsSnapshot {
        GuardStatsSnapshot {
            creates: self.forwarded(Operation::Create),
            updates: self.forwarded(Operation::Update),
            forces: self.forwarded(Operation::Force),
            closes: self.forwarded(Operation::Close),
            drops: self.forwarded(Operation::Drop),
            update_records: self.update_records.load(Ordering::Relaxed),
            illegal_state_rejections: self.illegal_state_rejections(),
            in_progress_rejections: self.in_progress_rejections(),
            resource_failures: self.resource_failures(),
        }
    }
}

/// A point-in-time copy of [`GuardStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuardStatsSnapshot {
    /// Forwarded `create` calls.
    pub creates: u64,
    /// Forwarded `update` calls.
    pub updates: u64,
    /// Forwarded `force` calls.
    pub forces: u64,
    /// Forwarded `close` calls.
    pub closes: u64,
    /// Forwarded `drop` calls.
    pub drops: u64,
    /// Change records in forwarded update batches.
    pub update_records: u64,
    /// Calls rejected for being illegal in the current state.
    pub illegal_state_rejections: u64,
    /// Calls rejected because another operation was in flight.
    pub in_progress_rejections: u64,
    /// Forwarded calls that failed inside the index.
    pub resource_failures: u64,
}

impl GuardStatsSnapshot {
    /// Total calls rejected by the guard.
    #[must_use]
    pub fn contract_violations(&self) -> u64 {
        self.illegal_state_rejections + self.in_progress_rejections
    }

    /// Total calls forwarded to the index.
    #[must_use]
    pub fn forwarded(&self) -> u64 {
        self.creates + self.updates + self.forces + self.closes + self.drops
    }
}
