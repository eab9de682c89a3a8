//! Per-table operation counters
//!
//! - Counters only, monotonic
//! - Relaxed atomics: exact totals, no cross-counter consistency
//! - Snapshots serialize to JSON for the CLI

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operation counters for one table.
#[derive(Debug, Default)]
pub struct TableMetrics {
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    increments: AtomicU64,
    cas_succeeded: AtomicU64,
    cas_conflicts: AtomicU64,
    key_scans: AtomicU64,
    failures: AtomicU64,
}

impl TableMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a resolved read (one per requested cell or row)
    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Count cell writes
    pub fn record_writes(&self, cells: u64) {
        self.writes.fetch_add(cells, Ordering::Relaxed);
    }

    /// Count tombstone changes (point delete, delete-all, undelete-all)
    pub fn record_deletes(&self, cells: u64) {
        self.deletes.fetch_add(cells, Ordering::Relaxed);
    }

    pub fn record_increment(&self) {
        self.increments.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a compare-and-swap by outcome
    pub fn record_cas(&self, swapped: bool) {
        if swapped {
            self.cas_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cas_conflicts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_key_scan(&self) {
        self.key_scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an operation that returned an error
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            increments: self.increments.load(Ordering::Relaxed),
            cas_succeeded: self.cas_succeeded.load(Ordering::Relaxed),
            cas_conflicts: self.cas_conflicts.load(Ordering::Relaxed),
            key_scans: self.key_scans.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of a table's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub reads: u64,
    pub writes: u64,
    pub deletes: u64,
    pub increments: u64,
    pub cas_succeeded: u64,
    pub cas_conflicts: u64,
    pub key_scans: u64,
    pub failures: u64,
}
