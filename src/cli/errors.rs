//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::io;

use thiserror::Error;

use crate::table::{ConfigError, TableError};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Stable error code printed alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "OVC_CLI_CONFIG_ERROR",
            CliError::Table(e) if e.is_invalid_argument() => "OVC_INVALID_ARGUMENT",
            CliError::Table(e) if e.is_fatal() => "OVC_CORRUPTION",
            CliError::Table(_) => "OVC_BACKEND_UNAVAILABLE",
            CliError::Io(_) | CliError::Json(_) => "OVC_CLI_IO_ERROR",
        }
    }
}
