//! ovctable - Ordered, versioned, columnar tables
//!
//! Every cell keeps a history of versioned values. Reads go through a
//! [`mvcc::ReadPointer`] that decides which versions are visible, so the
//! same table can serve many snapshots at once.
//!
//! - [`mvcc`]: read pointers, cell histories, tombstones, visibility
//! - [`store`]: the backend contract plus in-memory and log-backed stores
//! - [`table`]: the table engine and the table registry
//! - [`observability`]: structured logging and per-table counters
//! - [`cli`]: the `ovctable` binary

pub mod cli;
pub mod mvcc;
pub mod observability;
pub mod store;
pub mod table;

pub use mvcc::ReadPointer;
pub use table::{HandleConfig, Table, TableError, TableHandle, TableResult};
