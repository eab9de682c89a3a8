//! CLI argument definitions using clap
//!
//! Commands:
//! - ovctable put <row> <column> <value> --version <v>
//! - ovctable get <row> <column> [--max <v>] [--counter]
//! - ovctable row <row> [--max <v>]
//! - ovctable delete | delete-all | undelete-all <row> <column>... --version <v>
//! - ovctable increment <row> <column> <amount> --version <v> [--max <v>]
//! - ovctable cas <row> <column> [--expected <s>] [--new <s>] --version <v> [--max <v>]
//! - ovctable keys [--limit <n>] [--offset <n>] [--max <v>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ovctable - ordered, versioned, columnar tables
#[derive(Parser, Debug)]
#[command(name = "ovctable")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file; overrides --data-dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for log-backed tables when no config file is given
    #[arg(long, global = true, default_value = "./ovctable-data")]
    pub data_dir: PathBuf,

    /// Table to operate on
    #[arg(long, global = true, default_value = "default")]
    pub table: String,

    /// Log INFO events to stdout
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write one cell at a version
    Put {
        row: String,
        column: String,
        value: String,
        #[arg(long)]
        version: u64,
    },

    /// Read one cell
    Get {
        row: String,
        column: String,
        /// Highest visible version (default: everything)
        #[arg(long)]
        max: Option<u64>,
        /// Decode the value as a counter
        #[arg(long)]
        counter: bool,
    },

    /// Read every visible column of a row
    Row {
        row: String,
        #[arg(long)]
        max: Option<u64>,
    },

    /// Point-delete one version of each column
    Delete {
        row: String,
        #[arg(required = true)]
        columns: Vec<String>,
        #[arg(long)]
        version: u64,
    },

    /// Hide every version at or below --version in each column
    DeleteAll {
        row: String,
        #[arg(required = true)]
        columns: Vec<String>,
        #[arg(long)]
        version: u64,
    },

    /// Remove the delete-all marker at exactly --version
    UndeleteAll {
        row: String,
        #[arg(required = true)]
        columns: Vec<String>,
        #[arg(long)]
        version: u64,
    },

    /// Add to a counter cell
    Increment {
        row: String,
        column: String,
        #[arg(allow_hyphen_values = true)]
        amount: i64,
        /// Version the new total is written at
        #[arg(long)]
        version: u64,
        #[arg(long)]
        max: Option<u64>,
    },

    /// Compare-and-swap one cell; omit --expected to require absence,
    /// omit --new to write a tombstone
    Cas {
        row: String,
        column: String,
        #[arg(long)]
        expected: Option<String>,
        #[arg(long = "new")]
        new_value: Option<String>,
        #[arg(long)]
        version: u64,
        #[arg(long)]
        max: Option<u64>,
    },

    /// List rows with at least one visible cell
    Keys {
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        max: Option<u64>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
