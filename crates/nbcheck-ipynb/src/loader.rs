//! Reading notebooks into the document model.

use std::fs;
use std::path::Path;

use nbcheck_core::{CellFailure, Document, DocumentResult, Failure, FailureKind};

use crate::error::{FormatError, FormatResult};
use crate::ipynb::JupyterNotebook;

/// Load a notebook for execution.
pub fn load(path: impl AsRef<Path>) -> FormatResult<Document> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| FormatError::ReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let document = parse_document(path, &bytes)?;
    tracing::debug!(
        "Loaded {} ({} cells, {} code)",
        path.display(),
        document.cells.len(),
        document.code_cells().count()
    );
    Ok(document)
}

/// Load a notebook as last saved, including recorded outputs.
///
/// Nothing is executed; the returned document is only inspected.
pub fn load_saved_outputs(path: impl AsRef<Path>) -> FormatResult<Document> {
    load(path)
}

/// Parse notebook bytes; `path` is attached to the document and to errors.
pub fn parse_document(path: impl AsRef<Path>, bytes: &[u8]) -> FormatResult<Document> {
    let path = path.as_ref();
    let parse_error = |message: String| FormatError::ParseError {
        path: path.to_path_buf(),
        message,
    };

    let text = std::str::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;
    let notebook: JupyterNotebook =
        serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;
    notebook.into_document(path).map_err(|e| match e {
        FormatError::InvalidNotebook(message) => parse_error(message),
        other => parse_error(other.to_string()),
    })
}

/// Error outputs recorded in a document's code cells, in cell order.
pub fn recorded_errors(document: &Document) -> Vec<CellFailure> {
    document
        .recorded_errors()
        .into_iter()
        .map(|(cell_index, error)| CellFailure {
            cell_index,
            failure: Failure::from_cell_error(FailureKind::RecordedError, error),
        })
        .collect()
}

/// Read-only check of a saved notebook.
///
/// Load failures become a failed result rather than an error.
pub fn check(path: impl AsRef<Path>) -> DocumentResult {
    let path = path.as_ref();
    match load_saved_outputs(path) {
        Ok(document) => {
            let recorded = recorded_errors(&document);
            if !recorded.is_empty() {
                tracing::info!("{} has {} recorded error(s)", path.display(), recorded.len());
            }
            DocumentResult::from_recorded(path, recorded)
        }
        Err(err) => {
            tracing::info!("{} could not be checked: {}", path.display(), err);
            DocumentResult::from_error(path, &nbcheck_core::Error::from(err))
        }
    }
}
