//! In-memory cell store
//!
//! Rows live in an ordered map of `Arc<RwLock<ColumnMap>>`. The outer lock
//! is held only long enough to find or insert a row, so operations on
//! different rows never wait on each other. Every mutation of a row holds
//! that row's write lock, which makes read-decide-write atomic per row.

use std::collections::BTreeMap;
use std::ops::{Bound, ControlFlow};
use std::sync::{Arc, RwLock};

use super::{CellDecision, CellStore, ColumnBounds, ColumnMap, RowVisitor, StoreError, StoreResult};
use crate::mvcc::{CellMutation, VersionedCell};

type RowRef = Arc<RwLock<ColumnMap>>;

/// Volatile store backing memory tables and the log store's image.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<Vec<u8>, RowRef>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows holding at least one cell.
    pub fn row_count(&self) -> StoreResult<usize> {
        Ok(self.rows.read().map_err(|_| StoreError::lock_poisoned())?.len())
    }

    fn find_row(&self, row: &[u8]) -> StoreResult<Option<RowRef>> {
        let rows = self.rows.read().map_err(|_| StoreError::lock_poisoned())?;
        Ok(rows.get(row).cloned())
    }

    fn row_or_insert(&self, row: &[u8]) -> StoreResult<RowRef> {
        if let Some(existing) = self.find_row(row)? {
            return Ok(existing);
        }
        let mut rows = self.rows.write().map_err(|_| StoreError::lock_poisoned())?;
        Ok(rows.entry(row.to_vec()).or_default().clone())
    }

    fn apply_to_row(columns: &mut ColumnMap, column: &[u8], mutation: &CellMutation) {
        // Undeleting a cell that was never written has nothing to reverse.
        if let CellMutation::UndeleteAll { .. } = mutation {
            if let Some(cell) = columns.get_mut(column) {
                cell.apply(mutation);
            }
            return;
        }
        columns
            .entry(column.to_vec())
            .or_insert_with(VersionedCell::new)
            .apply(mutation);
    }
}

impl CellStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn load_cell(&self, row: &[u8], column: &[u8]) -> StoreResult<Option<VersionedCell>> {
        let Some(row_ref) = self.find_row(row)? else {
            return Ok(None);
        };
        let columns = row_ref.read().map_err(|_| StoreError::lock_poisoned())?;
        Ok(columns.get(column).cloned())
    }

    fn load_columns(&self, row: &[u8], bounds: ColumnBounds<'_>) -> StoreResult<ColumnMap> {
        let Some(row_ref) = self.find_row(row)? else {
            return Ok(ColumnMap::new());
        };
        let columns = row_ref.read().map_err(|_| StoreError::lock_poisoned())?;
        if let (Bound::Included(start) | Bound::Excluded(start), Bound::Included(end) | Bound::Excluded(end)) =
            bounds
        {
            if start > end {
                return Ok(ColumnMap::new());
            }
            if start == end && !matches!(bounds, (Bound::Included(_), Bound::Included(_))) {
                return Ok(ColumnMap::new());
            }
        }
        Ok(columns
            .range::<[u8], _>(bounds)
            .map(|(column, cell)| (column.clone(), cell.clone()))
            .collect())
    }

    fn scan_rows(&self, visit: &mut RowVisitor<'_>) -> StoreResult<()> {
        let snapshot: Vec<(Vec<u8>, RowRef)> = {
            let rows = self.rows.read().map_err(|_| StoreError::lock_poisoned())?;
            rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        for (row, row_ref) in snapshot {
            let columns = row_ref.read().map_err(|_| StoreError::lock_poisoned())?;
            if let ControlFlow::Break(()) = visit(&row, &columns) {
                break;
            }
        }
        Ok(())
    }

    fn apply(&self, row: &[u8], column: &[u8], mutation: &CellMutation) -> StoreResult<()> {
        if let CellMutation::UndeleteAll { .. } = mutation {
            let Some(row_ref) = self.find_row(row)? else {
                return Ok(());
            };
            let mut columns = row_ref.write().map_err(|_| StoreError::lock_poisoned())?;
            Self::apply_to_row(&mut columns, column, mutation);
            return Ok(());
        }
        let row_ref = self.row_or_insert(row)?;
        let mut columns = row_ref.write().map_err(|_| StoreError::lock_poisoned())?;
        Self::apply_to_row(&mut columns, column, mutation);
        Ok(())
    }

    fn native_atomics(&self) -> bool {
        true
    }

    fn apply_atomic(
        &self,
        row: &[u8],
        column: &[u8],
        decide: &mut CellDecision<'_>,
    ) -> StoreResult<()> {
        if let Some(row_ref) = self.find_row(row)? {
            let mut columns = row_ref.write().map_err(|_| StoreError::lock_poisoned())?;
            if let Some(mutation) = decide(columns.get(column)) {
                Self::apply_to_row(&mut columns, column, &mutation);
            }
            return Ok(());
        }

        // Absent row: decide under the outer write lock and insert the row
        // only if the decision left a cell behind.
        let mut rows = self.rows.write().map_err(|_| StoreError::lock_poisoned())?;
        let existing = rows.get(row).cloned();
        if let Some(row_ref) = existing {
            drop(rows);
            let mut columns = row_ref.write().map_err(|_| StoreError::lock_poisoned())?;
            if let Some(mutation) = decide(columns.get(column)) {
                Self::apply_to_row(&mut columns, column, &mutation);
            }
            return Ok(());
        }
        if let Some(mutation) = decide(None) {
            let mut columns = ColumnMap::new();
            Self::apply_to_row(&mut columns, column, &mutation);
            if !columns.is_empty() {
                rows.insert(row.to_vec(), Arc::new(RwLock::new(columns)));
            }
        }
        Ok(())
    }
}
