//! Per-row exclusive sections
//!
//! Used when a backend has no native atomic apply. Each row gets its own
//! mutex, created on demand and dropped from the registry once nobody
//! holds or waits for it. The registry mutex only guards the lookup, so
//! callers working on different rows never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::store::{StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct RowLocks {
    registry: Mutex<HashMap<Vec<u8>, Arc<Mutex<()>>>>,
}

impl RowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the exclusive lock of `row`.
    pub fn with_row<T>(&self, row: &[u8], f: impl FnOnce() -> T) -> StoreResult<T> {
        let lock = {
            let mut registry = self.registry.lock().map_err(|_| StoreError::lock_poisoned())?;
            registry.entry(row.to_vec()).or_default().clone()
        };

        let result = match lock.lock() {
            Ok(_guard) => Ok(f()),
            Err(_) => Err(StoreError::lock_poisoned()),
        };

        // Our clone is released inside the registry section, so whoever
        // finishes last always sees only the registry's reference.
        let mut registry = self.registry.lock().map_err(|_| StoreError::lock_poisoned())?;
        let idle = Arc::strong_count(&lock) == 2;
        drop(lock);
        if idle {
            registry.remove(row);
        }
        result
    }

    /// Number of rows with a live lock entry.
    pub fn active_rows(&self) -> StoreResult<usize> {
        let registry = self.registry.lock().map_err(|_| StoreError::lock_poisoned())?;
        Ok(registry.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_entry_removed_after_use() {
        let locks = RowLocks::new();
        let value = locks.with_row(b"row", || 7).unwrap();
        assert_eq!(value, 7);
        assert_eq!(locks.active_rows().unwrap(), 0);
    }

    #[test]
    fn test_same_row_is_serialized() {
        let locks = Arc::new(RowLocks::new());
        let counter = Arc::new(Mutex::new(0u64));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..200 {
                        locks
                            .with_row(b"hot", || {
                                // Split read and write to expose interleaving.
                                let current = *counter.lock().unwrap();
                                thread::yield_now();
                                *counter.lock().unwrap() = current + 1;
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*counter.lock().unwrap(), 1600);
        assert_eq!(locks.active_rows().unwrap(), 0);
    }

    #[test]
    fn test_no_stale_entries_across_rows() {
        let locks = Arc::new(RowLocks::new());

        let handles: Vec<_> = (0..8)
            .map(|id| {
                let locks = Arc::clone(&locks);
                thread::spawn(move || {
                    for i in 0..500u32 {
                        // Two threads per row, so finishers overlap.
                        let row = [(id % 4) as u8, (i % 3) as u8];
                        locks.with_row(&row, thread::yield_now).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(locks.active_rows().unwrap(), 0);
    }
}
