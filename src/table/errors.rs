//! Table error types
//!
//! - `InvalidArgument`: the request itself is malformed (batch length
//!   mismatch, counter that is not 8 bytes)
//! - `Store`: the substrate failed; transient or fatal per [`StoreError`]
//!
//! Absence of a value is not an error, and a compare-and-swap mismatch is
//! reported as `Ok(false)`.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Errors surfaced by [`crate::table::Table`]
#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TableError {
    /// Parallel batch arrays of different lengths
    pub fn batch_mismatch(what: &str, columns: usize, other: usize) -> Self {
        TableError::InvalidArgument(format!(
            "{} columns but {} {}",
            columns, other, what
        ))
    }

    /// Stored counter value of the wrong width
    pub fn malformed_counter(len: usize) -> Self {
        TableError::InvalidArgument(format!(
            "counter value must be 8 bytes, found {}",
            len
        ))
    }

    /// Returns true for caller mistakes
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, TableError::InvalidArgument(_))
    }

    /// Returns true if the backend could not be reached
    pub fn is_transient(&self) -> bool {
        matches!(self, TableError::Store(e) if e.is_transient())
    }

    /// Returns true if stored state is corrupt
    pub fn is_fatal(&self) -> bool {
        matches!(self, TableError::Store(e) if e.is_fatal())
    }
}
