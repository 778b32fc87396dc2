//! Writing documents back to `.ipynb` files.

use std::fs;

use nbcheck_core::Document;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{FormatError, FormatResult};
use crate::ipynb::JupyterNotebook;

/// Serialize a document the way Jupyter does: one-space indent, sorted
/// keys, trailing newline.
pub fn to_json_string(document: &Document) -> FormatResult<String> {
    // Going through `Value` sorts object keys.
    let value = serde_json::to_value(JupyterNotebook::from_document(document))?;

    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut serializer)?;
    buf.push(b'\n');

    String::from_utf8(buf).map_err(|e| FormatError::InvalidNotebook(e.to_string()))
}

/// Overwrite the document's file with its current contents.
pub fn save(document: &Document) -> FormatResult<()> {
    let json = to_json_string(document)?;
    fs::write(&document.path, json).map_err(|e| FormatError::WriteError {
        path: document.path.clone(),
        message: e.to_string(),
    })?;
    tracing::debug!("Saved {}", document.path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbcheck_core::{Cell, Output};

    fn document() -> Document {
        let mut document = Document::new("w.ipynb", vec![Cell::markdown("# T"), Cell::code("1 + 1")]);
        document
            .attributes
            .insert("nbformat".to_string(), 4.into());
        document
            .attributes
            .insert("nbformat_minor".to_string(), 5.into());
        document
            .attributes
            .insert("metadata".to_string(), serde_json::json!({}));
        document
    }

    #[test]
    fn test_jupyter_layout() {
        let mut doc = document();
        doc.cells[1].execution_count = Some(1);
        doc.cells[1].outputs.push(Output::text_result("2", 1));
        let json = to_json_string(&doc).unwrap();

        assert!(json.starts_with("{\n \"cells\": [\n  {\n   \"cell_type\": \"markdown\""));
        assert!(json.ends_with("}\n"));
        assert!(json.contains("\"execution_count\": 1"));
        assert!(json.contains("\"text/plain\": [\n       \"2\"\n      ]"));
    }

    #[test]
    fn test_unexecuted_code_cell_keeps_null_count() {
        let json = to_json_string(&document()).unwrap();
        assert!(json.contains("\"execution_count\": null"));
        assert!(json.contains("\"outputs\": []"));
    }

    #[test]
    fn test_save_to_missing_directory_is_write_error() {
        let mut doc = document();
        doc.path = "/nonexistent/dir/w.ipynb".into();
        let err = save(&doc).unwrap_err();
        assert!(matches!(err, FormatError::WriteError { .. }));
        assert!(err.is_io());
    }
}
