//! Error types for nbcheck-core.

use thiserror::Error;

use crate::kernel::CellError;

/// Result type for nbcheck-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nbcheck-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Document is malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A code cell raised an uncaught error.
    #[error("cell {index} raised {}: {}", error.name, error.message)]
    CellExecution { index: usize, error: CellError },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid run configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
