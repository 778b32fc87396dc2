//! Error types for notebook loading and saving.

use std::path::PathBuf;

/// Result type for format operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors that can occur while reading, writing or finding notebooks.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Failed to read a notebook file.
    #[error("Failed to read file {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    /// Failed to write a notebook file.
    #[error("Failed to write file {path}: {message}")]
    WriteError { path: PathBuf, message: String },

    /// File contents are not a well-formed notebook.
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Failed to serialize/deserialize JSON.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid notebook structure.
    #[error("Invalid notebook: {0}")]
    InvalidNotebook(String),

    /// Notebook format major version other than 4.
    #[error("Unsupported nbformat version {0} (expected 4)")]
    UnsupportedVersion(u64),
}

impl FormatError {
    /// Whether the error comes from the filesystem rather than the contents.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            FormatError::ReadError { .. } | FormatError::WriteError { .. } | FormatError::IoError(_)
        )
    }
}

impl From<FormatError> for nbcheck_core::Error {
    fn from(err: FormatError) -> Self {
        if err.is_io() {
            nbcheck_core::Error::Io(std::io::Error::other(err.to_string()))
        } else {
            nbcheck_core::Error::Parse(err.to_string())
        }
    }
}
