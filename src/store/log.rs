//! Log-backed cell store
//!
//! Every mutation is appended to an append-only log file as a checksummed
//! [`LogRecord`] before it is applied to an in-memory image. Opening the
//! store replays the whole log into the image.
//!
//! # Failure handling
//!
//! - Append or fsync failure: the partial frame is truncated away, the
//!   mutation is not applied and the error is returned as transient
//! - Truncate failure, or an image that rejects a logged record: the
//!   writer halts and every later append fails as fatal
//! - Checksum mismatch, unknown record, truncated tail: fatal corruption,
//!   the store refuses to open
//!
//! The writer mutex is held across append and apply, so the log order and
//! the image order are always the same.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::record::MIN_RECORD_SIZE;
use super::{
    CellStore, ColumnBounds, ColumnMap, LogRecord, MemoryStore, RowVisitor, StoreError,
    StoreResult,
};
use crate::mvcc::{CellMutation, VersionedCell};
use crate::observability::Logger;

/// Durable store built from an append-only mutation log.
#[derive(Debug)]
pub struct LogStore {
    path: PathBuf,
    image: MemoryStore,
    writer: Mutex<LogWriter>,
    sync_writes: bool,
}

#[derive(Debug)]
struct LogWriter {
    file: File,
    offset: u64,
    /// Set once the file or the image can no longer be trusted. Every
    /// later append is refused with this reason.
    failed: Option<String>,
}

impl LogStore {
    /// Opens or creates the log at `path`, replaying any existing records.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corruption` if any record fails validation and
    /// `StoreError::Io` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, sync_writes: bool) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::io(
                        format!("failed to create log directory {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let image = MemoryStore::new();
        let replayed = match Self::replay(&path, &image) {
            Ok(count) => count,
            Err(err) => {
                if err.is_fatal() {
                    Logger::fatal(
                        "LOG_STORE_CORRUPTION",
                        &[("path", &path.display().to_string()), ("error", &err.to_string())],
                    );
                }
                return Err(err);
            }
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(format!("failed to open log {}", path.display()), e))?;
        let offset = file
            .metadata()
            .map_err(|e| StoreError::io("failed to read log metadata", e))?
            .len();

        Logger::info(
            "LOG_STORE_OPENED",
            &[
                ("path", &path.display().to_string()),
                ("records", &replayed.to_string()),
                ("bytes", &offset.to_string()),
            ],
        );

        Ok(Self {
            path,
            image,
            writer: Mutex::new(LogWriter {
                file,
                offset,
                failed: None,
            }),
            sync_writes,
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the log in bytes.
    pub fn log_len(&self) -> StoreResult<u64> {
        Ok(self.writer.lock().map_err(|_| StoreError::lock_poisoned())?.offset)
    }

    /// Reads every record of the log at `path` into `image`.
    ///
    /// Returns the number of records replayed. A missing file is an empty log.
    fn replay(path: &Path, image: &MemoryStore) -> StoreResult<u64> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(StoreError::io(
                    format!("failed to open log {}", path.display()),
                    e,
                ))
            }
        };
        let file_size = file
            .metadata()
            .map_err(|e| StoreError::io("failed to read log metadata", e))?
            .len();

        let mut reader = BufReader::new(file);
        let mut offset = 0u64;
        let mut count = 0u64;

        while offset < file_size {
            let remaining = file_size - offset;
            if remaining < MIN_RECORD_SIZE as u64 {
                return Err(StoreError::corruption_at_offset(
                    offset,
                    format!(
                        "truncated log: {} bytes remaining, minimum record size is {}",
                        remaining, MIN_RECORD_SIZE
                    ),
                ));
            }

            let mut len_buf = [0u8; 4];
            reader.read_exact(&mut len_buf).map_err(|e| {
                StoreError::corruption_at_offset(offset, format!("failed to read record length: {}", e))
            })?;
            let record_length = u32::from_le_bytes(len_buf) as u64;
            if record_length < MIN_RECORD_SIZE as u64 || record_length > remaining {
                return Err(StoreError::corruption_at_offset(
                    offset,
                    format!(
                        "invalid record length {} with {} bytes remaining",
                        record_length, remaining
                    ),
                ));
            }

            let mut frame = vec![0u8; record_length as usize];
            frame[..4].copy_from_slice(&len_buf);
            reader.read_exact(&mut frame[4..]).map_err(|e| {
                StoreError::corruption_at_offset(offset, format!("failed to read record: {}", e))
            })?;

            let record = LogRecord::decode(&frame)
                .map_err(|e| StoreError::corruption_at_offset(offset, e.to_string()))?;
            image.apply(&record.row, &record.column, &record.mutation)?;

            offset += record_length;
            count += 1;
        }

        Ok(count)
    }
}

impl CellStore for LogStore {
    fn kind(&self) -> &'static str {
        "log"
    }

    fn load_cell(&self, row: &[u8], column: &[u8]) -> StoreResult<Option<VersionedCell>> {
        self.image.load_cell(row, column)
    }

    fn load_columns(&self, row: &[u8], bounds: ColumnBounds<'_>) -> StoreResult<ColumnMap> {
        self.image.load_columns(row, bounds)
    }

    fn scan_rows(&self, visit: &mut RowVisitor<'_>) -> StoreResult<()> {
        self.image.scan_rows(visit)
    }

    fn apply(&self, row: &[u8], column: &[u8], mutation: &CellMutation) -> StoreResult<()> {
        let frame = LogRecord::new(row, column, mutation.clone()).encode();

        let mut writer = self.writer.lock().map_err(|_| StoreError::lock_poisoned())?;
        if let Some(reason) = &writer.failed {
            return Err(self.halted(reason));
        }

        let appended = writer.file.write_all(&frame).and_then(|()| {
            if self.sync_writes {
                writer.file.sync_data()
            } else {
                Ok(())
            }
        });
        if let Err(e) = appended {
            Logger::error(
                "LOG_STORE_APPEND_FAILED",
                &[("path", &self.path.display().to_string()), ("error", &e.to_string())],
            );
            // Drop any partial frame so later appends stay readable.
            let offset = writer.offset;
            if let Err(truncate) = writer.file.set_len(offset) {
                return Err(self.fail(
                    &mut writer,
                    format!(
                        "append failed ({}) and the partial frame at byte_offset {} could not be removed ({})",
                        e, offset, truncate
                    ),
                ));
            }
            return Err(StoreError::io(
                format!("failed to append to {}", self.path.display()),
                e,
            ));
        }
        writer.offset += frame.len() as u64;

        // The record is durable; an image that cannot take it no longer
        // matches the log.
        if let Err(e) = self.image.apply(row, column, mutation) {
            return Err(self.fail(
                &mut writer,
                format!("record logged but not applied to the image ({})", e),
            ));
        }
        Ok(())
    }
}

impl LogStore {
    /// Marks the writer as failed and reports it once at FATAL.
    fn fail(&self, writer: &mut LogWriter, reason: String) -> StoreError {
        Logger::fatal(
            "LOG_STORE_HALTED",
            &[("path", &self.path.display().to_string()), ("reason", &reason)],
        );
        let err = self.halted(&reason);
        writer.failed = Some(reason);
        err
    }

    fn halted(&self, reason: &str) -> StoreError {
        StoreError::Corruption {
            location: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
