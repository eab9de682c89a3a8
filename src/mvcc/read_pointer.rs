//! ReadPointer - Immutable visibility descriptor
//!
//! A read pointer describes which versions of a cell an operation may
//! observe:
//! - `max_version` bounds visibility from above, inclusive
//! - `write_version` is the version a read-modify-write commits at, and is
//!   itself visible so an operation observes its own writes
//! - `excluded` hides specific versions (in-flight or aborted writers)
//!   even when they fall below `max_version`
//!
//! This is a PURE VALUE TYPE. Once constructed it never changes.

use std::collections::BTreeSet;

/// A snapshot boundary used for every read in the engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReadPointer {
    /// Highest version visible to this pointer.
    max_version: u64,
    /// Version at which read-modify-write operations commit.
    write_version: u64,
    /// Versions hidden regardless of the upper bound.
    excluded: BTreeSet<u64>,
}

impl ReadPointer {
    /// Creates a pointer that sees every version up to and including `version`.
    ///
    /// The write version equals the read bound and nothing is excluded.
    #[inline]
    pub fn from_max(version: u64) -> Self {
        Self {
            max_version: version,
            write_version: version,
            excluded: BTreeSet::new(),
        }
    }

    /// Creates a pointer that sees everything ever written.
    #[inline]
    pub fn max() -> Self {
        Self::from_max(u64::MAX)
    }

    /// Creates a pointer that reads one snapshot but commits at another
    /// version, ignoring the given set of versions.
    pub fn full(
        read_max: u64,
        write_version: u64,
        excluded: impl IntoIterator<Item = u64>,
    ) -> Self {
        Self {
            max_version: read_max,
            write_version,
            excluded: excluded.into_iter().collect(),
        }
    }

    /// Returns the inclusive upper bound of visibility.
    #[inline]
    pub fn max_version(&self) -> u64 {
        self.max_version
    }

    /// Returns the version read-modify-write operations commit at.
    #[inline]
    pub fn write_version(&self) -> u64 {
        self.write_version
    }

    /// Returns the explicitly excluded versions.
    #[inline]
    pub fn excluded(&self) -> &BTreeSet<u64> {
        &self.excluded
    }

    /// Returns true if `version` is explicitly excluded.
    #[inline]
    pub fn is_excluded(&self, version: u64) -> bool {
        self.excluded.contains(&version)
    }

    /// Returns true if `version` falls inside this pointer's window.
    ///
    /// A version is visible when it is not excluded and is either at or
    /// below the read bound or equal to the pointer's own write version.
    #[inline]
    pub fn is_visible(&self, version: u64) -> bool {
        !self.is_excluded(version)
            && (version <= self.max_version || version == self.write_version)
    }
}
