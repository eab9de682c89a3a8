//! Ordered versioned columnar tables
//!
//! - [`Table`]: reads, writes, tombstones and read-modify-write over a
//!   [`crate::store::CellStore`]
//! - [`TableHandle`]: name -> table registry, backend chosen by
//!   [`HandleConfig`]
//! - [`RowLocks`]: per-row exclusion for stores without native atomics

mod config;
mod engine;
mod errors;
mod handle;
mod locks;

pub use config::{BackendKind, ConfigError, ConfigResult, HandleConfig};
pub use engine::{decode_counter, encode_counter, ColumnValues, Table};
pub use errors::{TableError, TableResult};
pub use handle::{TableHandle, LOG_FILE_EXTENSION};
pub use locks::RowLocks;

/// Lowercase hex encoding of `bytes`.
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::hex;

    #[test]
    fn test_hex() {
        assert_eq!(hex(b""), "");
        assert_eq!(hex(&[0x00, 0xab, 0x10]), "00ab10");
        assert_eq!(hex(b"t"), "74");
    }
}
