//! Table - Ordered, versioned, columnar table
//!
//! Every operation is expressed against a [`ReadPointer`] and delegated to
//! a [`CellStore`]. The table owns the semantics:
//! - visibility resolution for every read path
//! - batch validation
//! - atomic read-modify-write for increment and compare-and-swap
//!
//! # Atomicity
//!
//! Each cell mutation is one atomic unit. Batches are applied column by
//! column with no cross-column guarantee. When the store has a native
//! atomic apply, read-modify-write runs inside it; otherwise every
//! mutation of a row goes through [`RowLocks`], so plain writes are also
//! ordered against in-flight read-modify-writes on the same row.

use std::collections::BTreeMap;
use std::ops::{Bound, ControlFlow};
use std::sync::Arc;

use super::errors::{TableError, TableResult};
use super::locks::RowLocks;
use crate::mvcc::{CellMutation, CellPayload, ReadPointer, VersionedCell, Visibility};
use crate::observability::{display_key, Logger, MetricsSnapshot, Severity, TableMetrics};
use crate::store::CellStore;

/// Column name -> value, ordered by column bytes.
pub type ColumnValues = BTreeMap<Vec<u8>, Vec<u8>>;

/// A versioned table over a pluggable store.
#[derive(Debug)]
pub struct Table {
    name: Vec<u8>,
    store: Arc<dyn CellStore>,
    locks: RowLocks,
    metrics: TableMetrics,
}

impl Table {
    /// Creates a table over `store`.
    pub fn new(name: impl Into<Vec<u8>>, store: Arc<dyn CellStore>) -> Self {
        Self {
            name: name.into(),
            store,
            locks: RowLocks::new(),
            metrics: TableMetrics::new(),
        }
    }

    /// The table's name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Backend name, as reported by the store.
    pub fn backend(&self) -> &'static str {
        self.store.kind()
    }

    /// Current operation counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Returns the visible value of one cell.
    pub fn get(&self, row: &[u8], column: &[u8], rp: &ReadPointer) -> TableResult<Option<Vec<u8>>> {
        Ok(self
            .get_with_version(row, column, rp)?
            .map(|(value, _)| value))
    }

    /// Returns the visible value of one cell and the version it came from.
    pub fn get_with_version(
        &self,
        row: &[u8],
        column: &[u8],
        rp: &ReadPointer,
    ) -> TableResult<Option<(Vec<u8>, u64)>> {
        let cell = self.tracked(self.store.load_cell(row, column))?;
        self.metrics.record_read();
        let result = Visibility::resolve_opt(cell.as_ref(), rp);
        Ok(result
            .value()
            .zip(result.version())
            .map(|(value, version)| (value.to_vec(), version)))
    }

    /// Returns every visible column of a row.
    pub fn get_row(&self, row: &[u8], rp: &ReadPointer) -> TableResult<ColumnValues> {
        self.get_column_range(row, None, None, rp)
    }

    /// Returns the visible columns in `[start, stop)`; `None` leaves that
    /// side open.
    pub fn get_column_range(
        &self,
        row: &[u8],
        start: Option<&[u8]>,
        stop: Option<&[u8]>,
        rp: &ReadPointer,
    ) -> TableResult<ColumnValues> {
        let bounds = (
            start.map_or(Bound::Unbounded, Bound::Included),
            stop.map_or(Bound::Unbounded, Bound::Excluded),
        );
        let cells = self.tracked(self.store.load_columns(row, bounds))?;
        self.metrics.record_read();
        Ok(cells
            .iter()
            .filter_map(|(column, cell)| {
                Visibility::resolve(cell, rp)
                    .value()
                    .map(|value| (column.clone(), value.to_vec()))
            })
            .collect())
    }

    /// Returns the visible values of an explicit set of columns. Columns
    /// with nothing visible are left out.
    pub fn get_columns<C: AsRef<[u8]>>(
        &self,
        row: &[u8],
        columns: &[C],
        rp: &ReadPointer,
    ) -> TableResult<ColumnValues> {
        let mut values = ColumnValues::new();
        for column in columns {
            let column = column.as_ref();
            if let Some(value) = self.get(row, column, rp)? {
                values.insert(column.to_vec(), value);
            }
        }
        Ok(values)
    }

    /// Returns up to `limit` row keys with at least one visible cell,
    /// skipping the first `offset` such rows, in ascending key order.
    pub fn get_keys(
        &self,
        limit: usize,
        offset: usize,
        rp: &ReadPointer,
    ) -> TableResult<Vec<Vec<u8>>> {
        self.metrics.record_key_scan();
        let mut keys = Vec::new();
        if limit == 0 {
            return Ok(keys);
        }

        let mut skipped = 0usize;
        self.tracked(self.store.scan_rows(&mut |row, columns| {
            let visible = columns
                .values()
                .any(|cell| Visibility::resolve(cell, rp).is_visible());
            if !visible {
                return ControlFlow::Continue(());
            }
            if skipped < offset {
                skipped += 1;
                return ControlFlow::Continue(());
            }
            keys.push(row.to_vec());
            if keys.len() >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }))?;
        Ok(keys)
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Writes `values[i]` to `columns[i]` at `version`.
    ///
    /// Existing tombstones are left alone: a write at a point-deleted or
    /// delete-all-covered version stays hidden.
    pub fn put<C: AsRef<[u8]>, V: AsRef<[u8]>>(
        &self,
        row: &[u8],
        columns: &[C],
        version: u64,
        values: &[V],
    ) -> TableResult<()> {
        if columns.len() != values.len() {
            return Err(TableError::batch_mismatch("values", columns.len(), values.len()));
        }
        for (column, value) in columns.iter().zip(values) {
            self.mutate(
                row,
                column.as_ref(),
                CellMutation::Write {
                    version,
                    payload: CellPayload::Data(value.as_ref().to_vec()),
                },
            )?;
        }
        self.metrics.record_writes(columns.len() as u64);
        Ok(())
    }

    /// Point-deletes `version` in each column.
    pub fn delete<C: AsRef<[u8]>>(&self, row: &[u8], columns: &[C], version: u64) -> TableResult<()> {
        self.mutate_each(row, columns, CellMutation::PointDelete { version })
    }

    /// Hides every version at or below `version` in each column.
    pub fn delete_all<C: AsRef<[u8]>>(
        &self,
        row: &[u8],
        columns: &[C],
        version: u64,
    ) -> TableResult<()> {
        self.mutate_each(row, columns, CellMutation::DeleteAll { version })
    }

    /// Removes the delete-all marker at exactly `version` in each column.
    pub fn undelete_all<C: AsRef<[u8]>>(
        &self,
        row: &[u8],
        columns: &[C],
        version: u64,
    ) -> TableResult<()> {
        self.mutate_each(row, columns, CellMutation::UndeleteAll { version })
    }

    fn mutate_each<C: AsRef<[u8]>>(
        &self,
        row: &[u8],
        columns: &[C],
        mutation: CellMutation,
    ) -> TableResult<()> {
        for column in columns {
            self.mutate(row, column.as_ref(), mutation.clone())?;
        }
        self.metrics.record_deletes(columns.len() as u64);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Read-modify-write
    // ---------------------------------------------------------------------

    /// Adds `amount` to the counter in one cell and returns the new total.
    ///
    /// The current value is resolved under `rp` (absent counts as 0) and
    /// must be an 8-byte big-endian integer. The sum is written at
    /// `write_version`.
    pub fn increment(
        &self,
        row: &[u8],
        column: &[u8],
        amount: i64,
        rp: &ReadPointer,
        write_version: u64,
    ) -> TableResult<i64> {
        let mut total = 0i64;
        self.read_modify_write(row, column, |cell| {
            let current = match Visibility::resolve_opt(cell, rp).value() {
                Some(bytes) => decode_counter(bytes)?,
                None => 0,
            };
            total = current.wrapping_add(amount);
            Ok(Some(CellMutation::Write {
                version: write_version,
                payload: CellPayload::Data(encode_counter(total)),
            }))
        })?;
        self.metrics.record_increment();
        Ok(total)
    }

    /// Increments several counters of one row. Each column is atomic on its
    /// own; the batch as a whole is not.
    pub fn increment_columns<C: AsRef<[u8]>>(
        &self,
        row: &[u8],
        columns: &[C],
        amounts: &[i64],
        rp: &ReadPointer,
        write_version: u64,
    ) -> TableResult<BTreeMap<Vec<u8>, i64>> {
        if columns.len() != amounts.len() {
            return Err(TableError::batch_mismatch("amounts", columns.len(), amounts.len()));
        }
        let mut totals = BTreeMap::new();
        for (column, amount) in columns.iter().zip(amounts) {
            let column = column.as_ref();
            let total = self.increment(row, column, *amount, rp, write_version)?;
            totals.insert(column.to_vec(), total);
        }
        Ok(totals)
    }

    /// Writes `new_value` at `write_version` only if the value visible under
    /// `rp` equals `expected`.
    ///
    /// `expected = None` matches a cell with nothing visible. `new_value =
    /// None` writes an explicit tombstone, so later reads see nothing.
    /// Returns `Ok(false)` on mismatch, leaving the cell untouched.
    pub fn compare_and_swap(
        &self,
        row: &[u8],
        column: &[u8],
        expected: Option<&[u8]>,
        new_value: Option<&[u8]>,
        rp: &ReadPointer,
        write_version: u64,
    ) -> TableResult<bool> {
        let mut swapped = false;
        self.read_modify_write(row, column, |cell| {
            let current = Visibility::resolve_opt(cell, rp).value();
            if current != expected {
                return Ok(None);
            }
            swapped = true;
            Ok(Some(CellMutation::Write {
                version: write_version,
                payload: CellPayload::from_option(new_value),
            }))
        })?;

        self.metrics.record_cas(swapped);
        if !swapped && Logger::enabled(Severity::Trace) {
            Logger::trace(
                "CAS_CONFLICT",
                &[
                    ("table", &display_key(&self.name)),
                    ("row", &display_key(row)),
                    ("column", &display_key(column)),
                    ("write_version", &write_version.to_string()),
                ],
            );
        }
        Ok(swapped)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn mutate(&self, row: &[u8], column: &[u8], mutation: CellMutation) -> TableResult<()> {
        let result = if self.store.native_atomics() {
            self.store.apply(row, column, &mutation)
        } else {
            self.locks
                .with_row(row, || self.store.apply(row, column, &mutation))
                .and_then(|inner| inner)
        };
        self.tracked(result)
    }

    /// Resolves the cell, lets `decide` pick a mutation, and applies it
    /// with no other mutation of the row in between.
    fn read_modify_write<F>(&self, row: &[u8], column: &[u8], mut decide: F) -> TableResult<()>
    where
        F: FnMut(Option<&VersionedCell>) -> TableResult<Option<CellMutation>>,
    {
        if self.store.native_atomics() {
            let mut failure = None;
            let applied = self.store.apply_atomic(row, column, &mut |cell| {
                match decide(cell) {
                    Ok(mutation) => mutation,
                    Err(err) => {
                        failure = Some(err);
                        None
                    }
                }
            });
            self.tracked(applied)?;
            return match failure {
                Some(err) => Err(self.failed(err)),
                None => Ok(()),
            };
        }

        let outcome = self.locks.with_row(row, || -> TableResult<()> {
            let cell = self.store.load_cell(row, column)?;
            if let Some(mutation) = decide(cell.as_ref())? {
                self.store.apply(row, column, &mutation)?;
            }
            Ok(())
        });
        match outcome {
            Ok(inner) => inner.map_err(|err| self.failed(err)),
            Err(err) => Err(self.failed(err.into())),
        }
    }

    /// Counts and logs store failures on their way to the caller.
    fn tracked<T>(&self, result: crate::store::StoreResult<T>) -> TableResult<T> {
        result.map_err(|err| self.failed(err.into()))
    }

    fn failed(&self, err: TableError) -> TableError {
        self.metrics.record_failure();
        if err.is_fatal() {
            Logger::fatal(
                "TABLE_STORE_CORRUPTION",
                &[("table", &display_key(&self.name)), ("error", &err.to_string())],
            );
        } else if err.is_transient() {
            Logger::error(
                "TABLE_STORE_UNAVAILABLE",
                &[("table", &display_key(&self.name)), ("error", &err.to_string())],
            );
        }
        err
    }
}

/// Encodes a counter as 8 big-endian bytes.
pub fn encode_counter(value: i64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decodes an 8-byte big-endian counter.
pub fn decode_counter(bytes: &[u8]) -> TableResult<i64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| TableError::malformed_counter(bytes.len()))?;
    Ok(i64::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::store::{
        CellDecision, ColumnBounds, ColumnMap, LogStore, MemoryStore, RowVisitor, StoreError,
        StoreResult,
    };
    use tempfile::TempDir;

    /// Memory store whose writes can be switched to fail as unavailable.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        native: bool,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn new(native: bool) -> Self {
            Self {
                native,
                ..Self::default()
            }
        }

        fn check(&self) -> StoreResult<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("backend down".to_string()));
            }
            Ok(())
        }
    }

    impl CellStore for FlakyStore {
        fn kind(&self) -> &'static str {
            "flaky"
        }

        fn load_cell(&self, row: &[u8], column: &[u8]) -> StoreResult<Option<VersionedCell>> {
            self.inner.load_cell(row, column)
        }

        fn load_columns(&self, row: &[u8], bounds: ColumnBounds<'_>) -> StoreResult<ColumnMap> {
            self.inner.load_columns(row, bounds)
        }

        fn scan_rows(&self, visit: &mut RowVisitor<'_>) -> StoreResult<()> {
            self.inner.scan_rows(visit)
        }

        fn apply(&self, row: &[u8], column: &[u8], mutation: &CellMutation) -> StoreResult<()> {
            self.check()?;
            self.inner.apply(row, column, mutation)
        }

        fn native_atomics(&self) -> bool {
            self.native
        }

        fn apply_atomic(
            &self,
            row: &[u8],
            column: &[u8],
            decide: &mut CellDecision<'_>,
        ) -> StoreResult<()> {
            self.check()?;
            self.inner.apply_atomic(row, column, decide)
        }
    }

    const COL: &[u8] = &[0];

    fn memory_table() -> Table {
        Table::new("t", Arc::new(MemoryStore::new()))
    }

    fn counter(value: Option<Vec<u8>>) -> i64 {
        decode_counter(&value.unwrap()).unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let table = memory_table();
        table.put(b"row", &[COL], 1, &[b"value"]).unwrap();

        assert_eq!(table.get(b"row", COL, &ReadPointer::max()).unwrap(), Some(b"value".to_vec()));
        assert_eq!(table.get(b"row", COL, &ReadPointer::from_max(1)).unwrap(), Some(b"value".to_vec()));
        assert_eq!(table.get(b"row", COL, &ReadPointer::from_max(0)).unwrap(), None);
    }

    #[test]
    fn test_put_length_mismatch() {
        let table = memory_table();
        let err = table.put(b"row", &[COL, &b"x"[..]], 1, &[b"only-one"]).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(table.get_row(b"row", &ReadPointer::max()).unwrap().is_empty());
    }

    #[test]
    fn test_get_with_version() {
        let table = memory_table();
        table.put(b"row", &[COL], 4, &[b"four"]).unwrap();
        table.put(b"row", &[COL], 9, &[b"nine"]).unwrap();

        assert_eq!(
            table.get_with_version(b"row", COL, &ReadPointer::from_max(8)).unwrap(),
            Some((b"four".to_vec(), 4))
        );
    }

    #[test]
    fn test_column_range_is_half_open() {
        let table = memory_table();
        table
            .put(b"row", &[b"a", b"b", b"c", b"d"], 1, &[b"1", b"2", b"3", b"4"])
            .unwrap();

        let range = table
            .get_column_range(b"row", Some(&b"b"[..]), Some(&b"d"[..]), &ReadPointer::max())
            .unwrap();
        assert_eq!(range.keys().cloned().collect::<Vec<_>>(), vec![b"b".to_vec(), b"c".to_vec()]);

        let open_start = table
            .get_column_range(b"row", None, Some(&b"c"[..]), &ReadPointer::max())
            .unwrap();
        assert_eq!(open_start.len(), 2);

        let inverted = table
            .get_column_range(b"row", Some(&b"d"[..]), Some(&b"a"[..]), &ReadPointer::max())
            .unwrap();
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_get_columns_omits_invisible() {
        let table = memory_table();
        table.put(b"row", &[b"a", b"b"], 1, &[b"1", b"2"]).unwrap();
        table.delete(b"row", &[b"b"], 1).unwrap();

        let values = table
            .get_columns(b"row", &[&b"a"[..], &b"b"[..], &b"missing"[..]], &ReadPointer::max())
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get(&b"a"[..]), Some(&b"1".to_vec()));
    }

    #[test]
    fn test_increment_rejects_non_counter() {
        let table = memory_table();
        table.put(b"row", &[COL], 1, &[b"abc"]).unwrap();

        let err = table.increment(b"row", COL, 1, &ReadPointer::max(), 2).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(table.get(b"row", COL, &ReadPointer::max()).unwrap(), Some(b"abc".to_vec()));
    }

    #[test]
    fn test_increment_wraps() {
        let table = memory_table();
        table.put(b"row", &[COL], 1, &[encode_counter(i64::MAX)]).unwrap();
        assert_eq!(
            table.increment(b"row", COL, 1, &ReadPointer::max(), 2).unwrap(),
            i64::MIN
        );
    }

    #[test]
    fn test_increment_columns_length_mismatch() {
        let table = memory_table();
        let err = table
            .increment_columns(b"row", &[COL], &[1, 2], &ReadPointer::max(), 1)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_cas_to_none_hides_value() {
        let table = memory_table();
        table.put(b"row", &[COL], 1, &[b"v"]).unwrap();

        assert!(table
            .compare_and_swap(b"row", COL, Some(&b"v"[..]), None, &ReadPointer::max(), 2)
            .unwrap());
        assert_eq!(table.get(b"row", COL, &ReadPointer::max()).unwrap(), None);
        assert_eq!(table.get(b"row", COL, &ReadPointer::from_max(1)).unwrap(), Some(b"v".to_vec()));
        assert!(table.get_keys(usize::MAX, 0, &ReadPointer::max()).unwrap().is_empty());
    }

    #[test]
    fn test_cas_respects_read_pointer() {
        let table = memory_table();
        table.put(b"row", &[COL], 1, &[b"old"]).unwrap();
        table.put(b"row", &[COL], 5, &[b"new"]).unwrap();

        // Reading at 3 sees "old", so swapping from "new" must fail.
        let rp = ReadPointer::from_max(3);
        assert!(!table.compare_and_swap(b"row", COL, Some(&b"new"[..]), Some(&b"x"[..]), &rp, 3).unwrap());
        assert!(table.compare_and_swap(b"row", COL, Some(&b"old"[..]), Some(&b"x"[..]), &rp, 3).unwrap());
        assert_eq!(table.metrics().cas_conflicts, 1);
        assert_eq!(table.metrics().cas_succeeded, 1);
    }

    #[test]
    fn test_log_store_uses_row_locks() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path().join("t.ovc"), false).unwrap();
        let table = Table::new("t", Arc::new(store));
        assert_eq!(table.backend(), "log");

        assert_eq!(table.increment(b"row", COL, 5, &ReadPointer::max(), 1).unwrap(), 5);
        assert_eq!(table.increment(b"row", COL, 5, &ReadPointer::max(), 2).unwrap(), 10);
        assert_eq!(counter(table.get(b"row", COL, &ReadPointer::max()).unwrap()), 10);
        assert_eq!(table.locks.active_rows().unwrap(), 0);
    }

    #[test]
    fn test_get_keys_zero_limit() {
        let table = memory_table();
        table.put(b"row", &[COL], 1, &[b"v"]).unwrap();
        assert!(table.get_keys(0, 0, &ReadPointer::max()).unwrap().is_empty());
    }

    #[test]
    fn test_counter_codec() {
        assert_eq!(encode_counter(3), vec![0, 0, 0, 0, 0, 0, 0, 3]);
        assert_eq!(decode_counter(&encode_counter(-42)).unwrap(), -42);
        assert!(decode_counter(&[1, 2, 3]).is_err());
    }

    fn unavailable_store_leaves_cells(native: bool) {
        let store = Arc::new(FlakyStore::new(native));
        let table = Table::new("t", store.clone());
        table.put(b"row", &[COL], 1, &[encode_counter(7)]).unwrap();
        store.down.store(true, Ordering::SeqCst);

        let err = table.put(b"row", &[COL], 2, &[b"lost"]).unwrap_err();
        assert!(err.is_transient());
        assert!(!err.is_fatal());
        assert_eq!(table.metrics().failures, 1);

        let err = table.increment(b"row", COL, 1, &ReadPointer::max(), 3).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(table.metrics().failures, 2);
        assert_eq!(table.metrics().increments, 0);

        let err = table
            .compare_and_swap(b"row", COL, Some(&encode_counter(7)[..]), None, &ReadPointer::max(), 4)
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(table.metrics().failures, 3);

        assert_eq!(
            table.get_with_version(b"row", COL, &ReadPointer::max()).unwrap(),
            Some((encode_counter(7), 1))
        );

        store.down.store(false, Ordering::SeqCst);
        assert_eq!(table.increment(b"row", COL, 1, &ReadPointer::max(), 5).unwrap(), 8);
        assert_eq!(table.metrics().failures, 3);
    }

    #[test]
    fn test_unavailable_store_native_atomics() {
        unavailable_store_leaves_cells(true);
    }

    #[test]
    fn test_unavailable_store_row_locks() {
        unavailable_store_leaves_cells(false);
    }

    #[test]
    fn test_increment_skips_excluded_version() {
        let table = memory_table();
        table.put(b"row", &[COL], 1, &[encode_counter(10)]).unwrap();
        table.put(b"row", &[COL], 4, &[encode_counter(100)]).unwrap();

        // Version 4 belongs to an in-flight writer, so the sum builds on 10.
        let rp = ReadPointer::full(5, 6, [4]);
        assert_eq!(table.increment(b"row", COL, 1, &rp, 6).unwrap(), 11);
        assert_eq!(counter(table.get(b"row", COL, &rp).unwrap()), 11);
        assert_eq!(
            counter(table.get(b"row", COL, &ReadPointer::from_max(5)).unwrap()),
            100
        );
    }

    #[test]
    fn test_cas_skips_excluded_version() {
        let table = memory_table();
        table.put(b"row", &[COL], 1, &[b"committed"]).unwrap();
        table.put(b"row", &[COL], 3, &[b"pending"]).unwrap();

        let rp = ReadPointer::full(5, 6, [3]);
        assert!(!table
            .compare_and_swap(b"row", COL, Some(&b"pending"[..]), Some(&b"x"[..]), &rp, 6)
            .unwrap());
        assert!(table
            .compare_and_swap(b"row", COL, Some(&b"committed"[..]), Some(&b"x"[..]), &rp, 6)
            .unwrap());
        assert_eq!(table.get(b"row", COL, &rp).unwrap(), Some(b"x".to_vec()));
    }

    #[test]
    fn test_delete_all_floor_uses_read_bound() {
        let table = memory_table();
        table.put(b"row", &[COL], 1, &[b"one"]).unwrap();
        table.delete_all(b"row", &[COL], 3).unwrap();

        // An excluded marker still hides what it covers.
        let excluded = ReadPointer::full(10, 10, [3]);
        assert_eq!(table.get(b"row", COL, &excluded).unwrap(), None);

        // A marker at the own write version above the bound does not count.
        let own_write = ReadPointer::full(2, 3, []);
        assert_eq!(table.get(b"row", COL, &own_write).unwrap(), Some(b"one".to_vec()));
    }

    #[test]
    fn test_failed_cas_on_absent_rows_leaves_no_keys() {
        let store = Arc::new(MemoryStore::new());
        let table = Table::new("t", store.clone());
        for i in 0..1000u32 {
            let row = i.to_be_bytes();
            let rp = ReadPointer::max();
            assert!(!table
                .compare_and_swap(&row, COL, Some(&b"x"[..]), Some(&b"y"[..]), &rp, 1)
                .unwrap());
        }
        assert_eq!(store.row_count().unwrap(), 0);
        assert!(table.get_keys(usize::MAX, 0, &ReadPointer::max()).unwrap().is_empty());
    }
}
