//! TombstoneIndex - Point deletes and delete-all markers for one cell
//!
//! Two independent kinds of tombstone are tracked:
//! - point deletes hide exactly one version, and are sticky: a later write
//!   at the same version stays hidden
//! - delete-all markers hide every version at or below the marker
//!
//! Delete-all markers are reversible. Undelete removes exactly one marker
//! and never touches point deletes or other markers. Nothing is ever
//! reconstructed because nothing is ever destroyed.

use std::collections::BTreeSet;

use super::ReadPointer;

/// Tombstone bookkeeping for a single cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TombstoneIndex {
    point_deletes: BTreeSet<u64>,
    delete_all: BTreeSet<u64>,
}

impl TombstoneIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `version` as point-deleted.
    ///
    /// Returns false if it was already deleted.
    pub fn mark_point_delete(&mut self, version: u64) -> bool {
        self.point_deletes.insert(version)
    }

    /// Installs a delete-all marker at `version`.
    ///
    /// Returns false if the marker was already active.
    pub fn add_delete_all(&mut self, version: u64) -> bool {
        self.delete_all.insert(version)
    }

    /// Removes the delete-all marker at exactly `version`.
    ///
    /// Returns false if no such marker was active.
    pub fn remove_delete_all(&mut self, version: u64) -> bool {
        self.delete_all.remove(&version)
    }

    /// Returns true if `version` has been point-deleted.
    #[inline]
    pub fn is_point_deleted(&self, version: u64) -> bool {
        self.point_deletes.contains(&version)
    }

    /// Returns the highest delete-all marker at or below `rp`'s read bound.
    ///
    /// Every version at or below the returned floor is hidden. Markers are
    /// not subject to exclusion, and a marker at the pointer's own write
    /// version above the bound does not count.
    pub fn floor(&self, rp: &ReadPointer) -> Option<u64> {
        self.delete_all
            .range(..=rp.max_version())
            .next_back()
            .copied()
    }

    /// Returns the point-deleted versions in ascending order.
    pub fn point_deletes(&self) -> impl Iterator<Item = u64> + '_ {
        self.point_deletes.iter().copied()
    }

    /// Returns the active delete-all markers in ascending order.
    pub fn delete_all_markers(&self) -> impl Iterator<Item = u64> + '_ {
        self.delete_all.iter().copied()
    }

    /// Returns true if no tombstone of either kind is recorded.
    pub fn is_empty(&self) -> bool {
        self.point_deletes.is_empty() && self.delete_all.is_empty()
    }
}
