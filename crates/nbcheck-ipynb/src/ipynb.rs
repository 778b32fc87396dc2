//! Jupyter notebook (.ipynb) wire types.
//!
//! Mirrors nbformat v4 closely enough to round-trip files written by
//! Jupyter: unknown keys are kept in `extra` maps, source text keeps its
//! string-or-list form, and code cells always carry `outputs` and
//! `execution_count`.

use nbcheck_core::{Attributes, Cell, CellError, CellKind, Document, Output, Source};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{FormatError, FormatResult};

/// Supported nbformat major version.
pub const NBFORMAT: u64 = 4;

/// A Jupyter notebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupyterNotebook {
    /// Notebook cells
    pub cells: Vec<JupyterCell>,

    /// Everything else: `metadata`, `nbformat`, `nbformat_minor`, ...
    #[serde(flatten)]
    pub extra: Attributes,
}

/// Text stored either as one string or as a list of line fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineString {
    Single(String),
    Lines(Vec<String>),
}

impl MultilineString {
    /// Split text into line fragments that keep their `\n`.
    pub fn from_text(text: &str) -> Self {
        MultilineString::Lines(split_lines(text))
    }

    pub fn text(&self) -> String {
        match self {
            MultilineString::Single(text) => text.clone(),
            MultilineString::Lines(lines) => lines.concat(),
        }
    }
}

/// A Jupyter cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupyterCell {
    /// Cell type
    pub cell_type: String,

    /// Cell source
    pub source: MultilineString,

    /// Cell outputs (for code cells)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<CellOutput>>,

    /// Execution count (for code cells); `Some(None)` is an explicit null.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub execution_count: Option<Option<u32>>,

    /// `metadata`, `id`, `attachments` and anything else.
    #[serde(flatten)]
    pub extra: Attributes,
}

/// Distinguish an explicit `null` from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Cell output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "output_type")]
pub enum CellOutput {
    /// Standard output/error
    #[serde(rename = "stream")]
    Stream { name: String, text: MultilineString },

    /// Value of the cell's final expression
    #[serde(rename = "execute_result")]
    ExecuteResult {
        execution_count: Option<u32>,
        data: Attributes,
        #[serde(default)]
        metadata: Attributes,
    },

    /// Display data
    #[serde(rename = "display_data")]
    DisplayData {
        data: Attributes,
        #[serde(default)]
        metadata: Attributes,
    },

    /// Error output
    #[serde(rename = "error")]
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(String::from).collect()
}

/// Store text MIME values as line lists, the way Jupyter writes them.
fn split_mime_data(data: &Attributes) -> Attributes {
    data.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) if key.starts_with("text/") => Value::Array(
                    split_lines(text).into_iter().map(Value::String).collect(),
                ),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

impl From<&CellOutput> for Output {
    fn from(output: &CellOutput) -> Self {
        match output {
            CellOutput::Stream { name, text } => Output::Stream {
                name: name.clone(),
                text: text.text(),
            },
            CellOutput::ExecuteResult {
                execution_count,
                data,
                metadata,
            } => Output::Display {
                data: data.clone(),
                metadata: metadata.clone(),
                execution_count: *execution_count,
            },
            CellOutput::DisplayData { data, metadata } => Output::Display {
                data: data.clone(),
                metadata: metadata.clone(),
                execution_count: None,
            },
            CellOutput::Error {
                ename,
                evalue,
                traceback,
            } => Output::Error(CellError {
                name: ename.clone(),
                message: evalue.clone(),
                trace: traceback.clone(),
            }),
        }
    }
}

impl From<&Output> for CellOutput {
    fn from(output: &Output) -> Self {
        match output {
            Output::Stream { name, text } => CellOutput::Stream {
                name: name.clone(),
                text: MultilineString::from_text(text),
            },
            Output::Display {
                data,
                metadata,
                execution_count: Some(count),
            } => CellOutput::ExecuteResult {
                execution_count: Some(*count),
                data: split_mime_data(data),
                metadata: metadata.clone(),
            },
            Output::Display {
                data,
                metadata,
                execution_count: None,
            } => CellOutput::DisplayData {
                data: split_mime_data(data),
                metadata: metadata.clone(),
            },
            Output::Error(error) => CellOutput::Error {
                ename: error.name.clone(),
                evalue: error.message.clone(),
                traceback: error.trace.clone(),
            },
        }
    }
}

impl JupyterCell {
    /// Convert to the document model.
    pub fn to_cell(&self, sequence_index: usize) -> FormatResult<Cell> {
        let kind = CellKind::from_tag(&self.cell_type).ok_or_else(|| {
            FormatError::InvalidNotebook(format!(
                "cell {} has unknown cell_type '{}'",
                sequence_index, self.cell_type
            ))
        })?;
        let source = match &self.source {
            MultilineString::Single(text) => Source::Text(text.clone()),
            MultilineString::Lines(lines) => Source::Lines(lines.clone()),
        };
        let outputs = self
            .outputs
            .iter()
            .flatten()
            .map(Output::from)
            .collect();

        Ok(Cell {
            kind,
            source,
            outputs,
            execution_count: self.execution_count.flatten(),
            sequence_index,
            attributes: self.extra.clone(),
        })
    }

    /// Convert from the document model.
    pub fn from_cell(cell: &Cell) -> Self {
        let source = match &cell.source {
            Source::Text(text) => MultilineString::Single(text.clone()),
            Source::Lines(lines) => MultilineString::Lines(lines.clone()),
        };
        let (outputs, execution_count) = if cell.is_code() {
            (
                Some(cell.outputs.iter().map(CellOutput::from).collect()),
                Some(cell.execution_count),
            )
        } else {
            (None, None)
        };

        Self {
            cell_type: cell.kind.as_str().to_string(),
            source,
            outputs,
            execution_count,
            extra: cell.attributes.clone(),
        }
    }
}

impl JupyterNotebook {
    /// Check the format version.
    pub fn validate(&self) -> FormatResult<()> {
        match self.extra.get("nbformat") {
            Some(Value::Number(n)) if n.as_u64() == Some(NBFORMAT) => Ok(()),
            Some(Value::Number(n)) => Err(FormatError::UnsupportedVersion(n.as_u64().unwrap_or(0))),
            Some(_) => Err(FormatError::InvalidNotebook(
                "nbformat must be a number".to_string(),
            )),
            None => Err(FormatError::InvalidNotebook(
                "missing nbformat version".to_string(),
            )),
        }
    }

    /// Convert to the document model.
    pub fn into_document(self, path: impl AsRef<std::path::Path>) -> FormatResult<Document> {
        self.validate()?;
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(index, cell)| cell.to_cell(index))
            .collect::<FormatResult<Vec<_>>>()?;
        let mut document = Document::new(path, cells);
        document.attributes = self.extra;
        Ok(document)
    }

    /// Convert from the document model.
    pub fn from_document(document: &Document) -> Self {
        let mut cells: Vec<&Cell> = document.cells.iter().collect();
        cells.sort_by_key(|cell| cell.sequence_index);
        Self {
            cells: cells.into_iter().map(JupyterCell::from_cell).collect(),
            extra: document.attributes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notebook(value: Value) -> JupyterNotebook {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_minimal_notebook() {
        let nb = notebook(json!({
            "cells": [
                {"cell_type": "markdown", "metadata": {}, "source": "# Title"},
                {"cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [],
                 "source": ["x = 1\n", "x"]}
            ],
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 5
        }));
        let doc = nb.into_document("a.ipynb").unwrap();
        assert_eq!(doc.cells.len(), 2);
        assert_eq!(doc.cells[0].kind, CellKind::Markdown);
        assert_eq!(doc.cells[1].source.text(), "x = 1\nx");
        assert_eq!(doc.cells[1].sequence_index, 1);
        assert!(doc.attributes.contains_key("nbformat_minor"));
    }

    #[test]
    fn test_explicit_null_execution_count_survives() {
        let raw = json!({
            "cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [], "source": []
        });
        let cell: JupyterCell = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(cell.execution_count, Some(None));
        assert_eq!(serde_json::to_value(&cell).unwrap(), raw);
    }

    #[test]
    fn test_markdown_cell_has_no_outputs_key() {
        let cell = JupyterCell::from_cell(&Cell::markdown("text"));
        let value = serde_json::to_value(&cell).unwrap();
        assert!(value.get("outputs").is_none());
        assert!(value.get("execution_count").is_none());
    }

    #[test]
    fn test_error_output_maps_to_cell_error() {
        let output: CellOutput = serde_json::from_value(json!({
            "output_type": "error", "ename": "NameError", "evalue": "x", "traceback": ["t"]
        }))
        .unwrap();
        match Output::from(&output) {
            Output::Error(error) => {
                assert_eq!(error.name, "NameError");
                assert_eq!(error.trace, vec!["t".to_string()]);
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_result_text_is_split_into_lines() {
        let output = CellOutput::from(&Output::text_result("a\nb", 2));
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["output_type"], "execute_result");
        assert_eq!(value["execution_count"], 2);
        assert_eq!(value["data"]["text/plain"], json!(["a\n", "b"]));
    }

    #[test]
    fn test_unknown_cell_type_is_invalid() {
        let nb = notebook(json!({
            "cells": [{"cell_type": "heading", "metadata": {}, "source": "x"}],
            "metadata": {}, "nbformat": 4, "nbformat_minor": 5
        }));
        let err = nb.into_document("a.ipynb").unwrap_err();
        assert!(matches!(err, FormatError::InvalidNotebook(_)));
    }

    #[test]
    fn test_old_format_is_rejected() {
        let nb = notebook(json!({"cells": [], "metadata": {}, "nbformat": 3, "nbformat_minor": 0}));
        assert!(matches!(
            nb.validate(),
            Err(FormatError::UnsupportedVersion(3))
        ));
    }
}
