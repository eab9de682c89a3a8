//! Table registry
//!
//! A handle creates each table on first use and hands out the same
//! `Arc<Table>` afterwards. The backend for new tables comes from the
//! handle's [`HandleConfig`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::config::{BackendKind, ConfigResult, HandleConfig};
use super::engine::Table;
use super::errors::TableResult;
use super::hex;
use crate::observability::{display_key, Logger};
use crate::store::{CellStore, LogStore, MemoryStore, StoreError};

/// Extension of per-table log files.
pub const LOG_FILE_EXTENSION: &str = "ovc";

#[derive(Debug)]
pub struct TableHandle {
    config: HandleConfig,
    tables: RwLock<BTreeMap<Vec<u8>, Arc<Table>>>,
}

impl TableHandle {
    pub fn new(config: HandleConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tables: RwLock::new(BTreeMap::new()),
        })
    }

    /// A handle whose tables live in memory only.
    pub fn memory() -> Self {
        Self {
            config: HandleConfig::memory(),
            tables: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn config(&self) -> &HandleConfig {
        &self.config
    }

    /// Returns the table called `name`, creating it if needed.
    ///
    /// For the log backend, creating a table replays its log; a corrupt
    /// log fails here and the table is not registered.
    pub fn get_table(&self, name: impl AsRef<[u8]>) -> TableResult<Arc<Table>> {
        let name = name.as_ref();
        {
            let tables = self.tables.read().map_err(|_| StoreError::lock_poisoned())?;
            if let Some(table) = tables.get(name) {
                return Ok(Arc::clone(table));
            }
        }

        let mut tables = self.tables.write().map_err(|_| StoreError::lock_poisoned())?;
        // Another caller may have won the race between the two locks.
        if let Some(table) = tables.get(name) {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(Table::new(name, self.open_store(name)?));
        tables.insert(name.to_vec(), Arc::clone(&table));
        Logger::info(
            "TABLE_CREATED",
            &[("table", &display_key(name)), ("backend", table.backend())],
        );
        Ok(table)
    }

    /// Names of every table created through this handle, ordered.
    pub fn table_names(&self) -> TableResult<Vec<Vec<u8>>> {
        let tables = self.tables.read().map_err(|_| StoreError::lock_poisoned())?;
        Ok(tables.keys().cloned().collect())
    }

    fn open_store(&self, name: &[u8]) -> TableResult<Arc<dyn CellStore>> {
        match self.config.backend {
            BackendKind::Memory => Ok(Arc::new(MemoryStore::new())),
            BackendKind::Log => {
                let dir = self.config.data_dir.as_ref().ok_or_else(|| {
                    StoreError::Unavailable("log backend without data_dir".to_string())
                })?;
                let path = dir.join(format!("{}.{}", hex(name), LOG_FILE_EXTENSION));
                Ok(Arc::new(LogStore::open(path, self.config.sync_writes)?))
            }
        }
    }
}
