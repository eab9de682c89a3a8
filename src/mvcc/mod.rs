//! MVCC Domain Types
//!
//! The vocabulary every table operation is expressed in:
//! - `ReadPointer` - Immutable visibility window
//! - `VersionedCell` - Version history of one (row, column)
//! - `TombstoneIndex` - Point deletes and reversible delete-all markers
//! - `Visibility` - Deterministic resolution of a cell under a read pointer
//!
//! None of these types touch storage. Backends hold cells, the table
//! resolves them.

mod cell;
mod read_pointer;
mod tombstone;
mod visibility;

pub use cell::{CellMutation, CellPayload, VersionedCell};
pub use read_pointer::ReadPointer;
pub use tombstone::TombstoneIndex;
pub use visibility::{Visibility, VisibilityResult};
