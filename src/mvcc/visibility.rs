//! MVCC Visibility - Deterministic cell resolution
//!
//! ## Visibility Rule
//!
//! Given a cell `C` and a read pointer `R`:
//! 1. Let `floor` be the highest delete-all marker of `C` at or below
//!    `R`'s read bound; exclusions do not apply to markers
//! 2. Walk the versions of `C` from newest to oldest, skipping any version
//!    that is
//!    - outside `R`'s window (above the bound and not `R`'s own write),
//!    - excluded by `R`,
//!    - point-deleted,
//!    - at or below `floor`
//! 3. The first surviving version decides: data is visible, an explicit
//!    tombstone makes the cell invisible
//! 4. No survivor means the cell is invisible
//!
//! Invisibility is a normal result, never an error. Resolution is a pure
//! function of (cell state, read pointer).

use super::{CellPayload, ReadPointer, VersionedCell};

/// Result of resolving a cell against a read pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityResult<'a> {
    /// A value is visible at the given version
    Visible { version: u64, value: &'a [u8] },
    /// Nothing is visible
    Invisible,
}

impl<'a> VisibilityResult<'a> {
    /// Returns the visible value if any
    pub fn value(&self) -> Option<&'a [u8]> {
        match self {
            VisibilityResult::Visible { value, .. } => Some(value),
            VisibilityResult::Invisible => None,
        }
    }

    /// Returns the version that supplied the visible value
    pub fn version(&self) -> Option<u64> {
        match self {
            VisibilityResult::Visible { version, .. } => Some(*version),
            VisibilityResult::Invisible => None,
        }
    }

    /// Returns true if visible
    pub fn is_visible(&self) -> bool {
        matches!(self, VisibilityResult::Visible { .. })
    }
}

/// Stateless visibility resolver.
pub struct Visibility;

impl Visibility {
    /// Resolves the visible value of `cell` under `rp`.
    pub fn resolve<'a>(cell: &'a VersionedCell, rp: &ReadPointer) -> VisibilityResult<'a> {
        let tombstones = cell.tombstones();
        let floor = tombstones.floor(rp);

        let survivor = cell.versions_desc().find(|(version, _)| {
            rp.is_visible(*version)
                && !tombstones.is_point_deleted(*version)
                && floor.map_or(true, |f| *version > f)
        });

        match survivor {
            Some((version, CellPayload::Data(value))) => VisibilityResult::Visible {
                version,
                value: value.as_slice(),
            },
            Some((_, CellPayload::Tombstone)) | None => VisibilityResult::Invisible,
        }
    }

    /// Resolves an optional cell; a missing cell is invisible.
    pub fn resolve_opt<'a>(
        cell: Option<&'a VersionedCell>,
        rp: &ReadPointer,
    ) -> VisibilityResult<'a> {
        match cell {
            Some(cell) => Self::resolve(cell, rp),
            None => VisibilityResult::Invisible,
        }
    }
}
