//! VersionedCell - Ordered history of one (row, column) cell
//!
//! A cell holds:
//! - a version -> payload map, at most one payload per version
//! - a [`TombstoneIndex`] of point deletes and delete-all markers
//!
//! A payload is either data or an explicit tombstone. The explicit
//! tombstone is what a compare-and-swap to "no value" writes: unlike a
//! point delete it shadows every older version when it is the newest
//! visible entry.
//!
//! Cells are only ever changed through [`CellMutation`], so every backend
//! applies exactly the same state transitions.

use std::collections::BTreeMap;

use super::TombstoneIndex;

/// The payload stored at one version of a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellPayload {
    /// A value.
    Data(Vec<u8>),
    /// An explicit "no value" marker.
    Tombstone,
}

impl CellPayload {
    /// Builds a payload from an optional value, `None` becoming a tombstone.
    pub fn from_option(value: Option<&[u8]>) -> Self {
        match value {
            Some(bytes) => CellPayload::Data(bytes.to_vec()),
            None => CellPayload::Tombstone,
        }
    }

    /// Returns the data bytes, or `None` for a tombstone.
    #[inline]
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            CellPayload::Data(bytes) => Some(bytes),
            CellPayload::Tombstone => None,
        }
    }

    /// Returns true if this payload is a tombstone.
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, CellPayload::Tombstone)
    }
}

/// A single state transition of a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellMutation {
    /// Store `payload` at `version`, replacing any payload already there.
    Write { version: u64, payload: CellPayload },
    /// Point-delete `version`.
    PointDelete { version: u64 },
    /// Install a delete-all marker at `version`.
    DeleteAll { version: u64 },
    /// Remove the delete-all marker at exactly `version`.
    UndeleteAll { version: u64 },
}

impl CellMutation {
    /// Returns the version this mutation targets.
    pub fn version(&self) -> u64 {
        match self {
            CellMutation::Write { version, .. }
            | CellMutation::PointDelete { version }
            | CellMutation::DeleteAll { version }
            | CellMutation::UndeleteAll { version } => *version,
        }
    }
}

/// Version history and tombstones for one cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionedCell {
    versions: BTreeMap<u64, CellPayload>,
    tombstones: TombstoneIndex,
}

impl VersionedCell {
    /// Creates an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one mutation.
    ///
    /// Returns false if the mutation left the cell unchanged (a repeated
    /// delete, or an undelete with no matching marker).
    pub fn apply(&mut self, mutation: &CellMutation) -> bool {
        match mutation {
            CellMutation::Write { version, payload } => {
                self.versions.insert(*version, payload.clone()).as_ref() != Some(payload)
            }
            CellMutation::PointDelete { version } => self.tombstones.mark_point_delete(*version),
            CellMutation::DeleteAll { version } => self.tombstones.add_delete_all(*version),
            CellMutation::UndeleteAll { version } => self.tombstones.remove_delete_all(*version),
        }
    }

    /// Returns the payload stored at exactly `version`, ignoring tombstones.
    #[inline]
    pub fn payload_at(&self, version: u64) -> Option<&CellPayload> {
        self.versions.get(&version)
    }

    /// Iterates stored versions from newest to oldest.
    pub fn versions_desc(&self) -> impl Iterator<Item = (u64, &CellPayload)> + '_ {
        self.versions.iter().rev().map(|(v, p)| (*v, p))
    }

    /// Returns the tombstone index.
    #[inline]
    pub fn tombstones(&self) -> &TombstoneIndex {
        &self.tombstones
    }

    /// Returns the number of stored versions.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Returns true if the cell has neither versions nor tombstones.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty() && self.tombstones.is_empty()
    }
}
