//! Observability for ovctable
//!
//! - Structured logging (JSON lines, deterministic key order)
//! - Per-table operation counters
//!
//! Observability is read-only: nothing here changes the outcome of a
//! table operation, and a failed log write is ignored.
//!
//! # Usage
//!
//! ```ignore
//! use ovctable::observability::{Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! Logger::info("TABLE_CREATED", &[("table", "events")]);
//! ```

mod logger;
mod metrics;

pub use logger::{display_key, Logger, Severity};
pub use metrics::{MetricsSnapshot, TableMetrics};
