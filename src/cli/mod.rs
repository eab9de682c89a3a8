//! CLI module for ovctable
//!
//! A thin shell over [`crate::table`]: one operation per invocation,
//! one JSON object per line on stdout.

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{open_handle, run, run_command};
pub use errors::{CliError, CliResult};
