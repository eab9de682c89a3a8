//! Store error types
//!
//! Two failure classes reach callers:
//! - unavailability (I/O failure, poisoned lock): transient, the caller
//!   decides whether to retry
//! - corruption (checksum mismatch, malformed or truncated record): fatal,
//!   never masked

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a storage substrate
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("FATAL: corruption at {location}: {reason}")]
    Corruption { location: String, reason: String },
}

impl StoreError {
    /// Wraps an I/O failure with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            message: message.into(),
            source,
        }
    }

    /// Corruption found at a byte offset of a log file
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        StoreError::Corruption {
            location: format!("byte_offset {}", offset),
            reason: reason.into(),
        }
    }

    /// A shared lock was poisoned by a panicking writer
    pub fn lock_poisoned() -> Self {
        StoreError::Unavailable("lock poisoned".to_string())
    }

    /// Corruption is unrecoverable and must halt the store
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Corruption { .. })
    }

    /// Failures that may succeed if the caller tries again
    pub fn is_transient(&self) -> bool {
        !self.is_fatal()
    }
}
