//! Storage substrates for versioned tables
//!
//! A table never knows which backend holds its cells. It talks to a
//! [`CellStore`], which can:
//! - load a cell, or a range of columns of a row
//! - visit rows in lexicographic key order
//! - apply a [`CellMutation`] to one cell
//! - optionally run a read-decide-write sequence atomically
//!
//! Backends that cannot do the last one report `native_atomics() == false`
//! and the table supplies its own per-row locking instead.
//!
//! Provided backends:
//! - [`MemoryStore`] - volatile, per-row `RwLock`s, native atomics
//! - [`LogStore`] - append-only checksummed mutation log replayed into a
//!   memory image on open

mod errors;
mod log;
mod memory;
mod record;

pub use errors::{StoreError, StoreResult};
pub use log::LogStore;
pub use memory::MemoryStore;
pub use record::LogRecord;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Bound, ControlFlow};

use crate::mvcc::{CellMutation, VersionedCell};

/// Cells of one row, ordered by column bytes.
pub type ColumnMap = BTreeMap<Vec<u8>, VersionedCell>;

/// Column interval used by range loads.
pub type ColumnBounds<'a> = (Bound<&'a [u8]>, Bound<&'a [u8]>);

/// Row visitor used by [`CellStore::scan_rows`].
pub type RowVisitor<'a> = dyn FnMut(&[u8], &ColumnMap) -> ControlFlow<()> + 'a;

/// Decision callback used by [`CellStore::apply_atomic`].
///
/// Receives the current cell (if any) and returns the mutation to apply,
/// or `None` to leave the cell untouched.
pub type CellDecision<'a> = dyn FnMut(Option<&VersionedCell>) -> Option<CellMutation> + 'a;

/// Capability interface of a storage substrate.
pub trait CellStore: Send + Sync + fmt::Debug {
    /// Short backend name used in logs.
    fn kind(&self) -> &'static str;

    /// Loads a copy of one cell.
    fn load_cell(&self, row: &[u8], column: &[u8]) -> StoreResult<Option<VersionedCell>>;

    /// Loads copies of the row's cells whose column falls within `bounds`.
    fn load_columns(&self, row: &[u8], bounds: ColumnBounds<'_>) -> StoreResult<ColumnMap>;

    /// Visits every row in ascending key order until the visitor breaks.
    fn scan_rows(&self, visit: &mut RowVisitor<'_>) -> StoreResult<()>;

    /// Applies one mutation to one cell, creating the cell if needed.
    fn apply(&self, row: &[u8], column: &[u8], mutation: &CellMutation) -> StoreResult<()>;

    /// Whether [`CellStore::apply_atomic`] is supported.
    fn native_atomics(&self) -> bool {
        false
    }

    /// Runs `decide` against the current cell and applies its mutation
    /// with no other mutation of the same row in between.
    fn apply_atomic(
        &self,
        _row: &[u8],
        _column: &[u8],
        _decide: &mut CellDecision<'_>,
    ) -> StoreResult<()> {
        Err(StoreError::Unavailable(format!(
            "{} store has no native atomic apply",
            self.kind()
        )))
    }
}
