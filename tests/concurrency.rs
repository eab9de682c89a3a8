//! Concurrency Tests
//!
//! - Concurrent increments of one cell converge to the exact total
//! - Racing compare-and-swaps: exactly one winner per expected value
//! - Different rows progress independently
//!
//! The memory store uses its native atomic apply; the log store goes
//! through the table's row locks.

use std::sync::{Arc, Barrier};
use std::thread;

use ovctable::mvcc::ReadPointer;
use ovctable::table::{decode_counter, HandleConfig, Table, TableHandle};
use tempfile::TempDir;

const THREADS: usize = 8;
const PER_THREAD: usize = 250;
const COL: &[u8] = b"n";

fn memory_table() -> (Arc<Table>, Option<TempDir>) {
    (TableHandle::memory().get_table("concurrency").unwrap(), None)
}

fn log_table() -> (Arc<Table>, Option<TempDir>) {
    let dir = TempDir::new().unwrap();
    let handle = TableHandle::new(HandleConfig::log(dir.path()).with_sync_writes(false)).unwrap();
    (handle.get_table("concurrency").unwrap(), Some(dir))
}

fn spawn_all<F>(table: &Arc<Table>, work: F)
where
    F: Fn(&Table, usize) + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|id| {
            let table = Arc::clone(table);
            let work = Arc::clone(&work);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                work(&table, id);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn increments_converge(table: Arc<Table>) {
    spawn_all(&table, |table, _| {
        for _ in 0..PER_THREAD {
            table.increment(b"hot", COL, 1, &ReadPointer::max(), 1).unwrap();
        }
    });

    let value = table.get(b"hot", COL, &ReadPointer::max()).unwrap().unwrap();
    assert_eq!(decode_counter(&value).unwrap(), (THREADS * PER_THREAD) as i64);
    assert_eq!(table.metrics().increments, (THREADS * PER_THREAD) as u64);
}

fn cas_has_one_winner(table: Arc<Table>) {
    let winners = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counted = Arc::clone(&winners);
    spawn_all(&table, move |table, id| {
        let claim = format!("thread-{}", id);
        let won = table
            .compare_and_swap(b"lock", COL, None, Some(claim.as_bytes()), &ReadPointer::max(), 1)
            .unwrap();
        if won {
            counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    });

    assert_eq!(winners.load(std::sync::atomic::Ordering::SeqCst), 1);
    let metrics = table.metrics();
    assert_eq!(metrics.cas_succeeded, 1);
    assert_eq!(metrics.cas_conflicts, (THREADS - 1) as u64);
}

fn rows_are_independent(table: Arc<Table>) {
    spawn_all(&table, |table, id| {
        let row = format!("row-{}", id).into_bytes();
        for version in 1..=PER_THREAD as u64 {
            table.increment(&row, COL, 2, &ReadPointer::max(), version).unwrap();
        }
    });

    let keys = table.get_keys(usize::MAX, 0, &ReadPointer::max()).unwrap();
    assert_eq!(keys.len(), THREADS);
    for key in keys {
        let value = table.get(&key, COL, &ReadPointer::max()).unwrap().unwrap();
        assert_eq!(decode_counter(&value).unwrap(), (2 * PER_THREAD) as i64);
    }
}

#[test]
fn test_memory_increments_converge() {
    let (table, _dir) = memory_table();
    increments_converge(table);
}

#[test]
fn test_log_increments_converge() {
    let (table, _dir) = log_table();
    increments_converge(table);
}

#[test]
fn test_memory_cas_has_one_winner() {
    let (table, _dir) = memory_table();
    cas_has_one_winner(table);
}

#[test]
fn test_log_cas_has_one_winner() {
    let (table, _dir) = log_table();
    cas_has_one_winner(table);
}

#[test]
fn test_memory_rows_are_independent() {
    let (table, _dir) = memory_table();
    rows_are_independent(table);
}

#[test]
fn test_log_rows_are_independent() {
    let (table, _dir) = log_table();
    rows_are_independent(table);
}

/// Increments on the log store survive a reopen with the exact total.
#[test]
fn test_log_increments_replay() {
    let dir = TempDir::new().unwrap();
    let config = HandleConfig::log(dir.path()).with_sync_writes(false);
    {
        let handle = TableHandle::new(config.clone()).unwrap();
        increments_converge(handle.get_table("concurrency").unwrap());
    }

    let handle = TableHandle::new(config).unwrap();
    let table = handle.get_table("concurrency").unwrap();
    let value = table.get(b"hot", COL, &ReadPointer::max()).unwrap().unwrap();
    assert_eq!(decode_counter(&value).unwrap(), (THREADS * PER_THREAD) as i64);
}
