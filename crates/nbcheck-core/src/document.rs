//! In-memory document model.
//!
//! A [`Document`] is an ordered list of [`Cell`]s loaded from one notebook
//! file. The model is format-neutral: fields the checker does not interpret
//! (notebook metadata, cell ids, attachments) are carried in `attributes`
//! maps so a writer can put them back untouched.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::kernel::CellError;

/// Opaque key/value fields carried through load and save.
pub type Attributes = Map<String, Value>;

/// Kind of cell in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Executable source.
    Code,
    /// Narrative text, never executed.
    Markdown,
    /// Raw passthrough text, never executed.
    Raw,
}

impl CellKind {
    /// The on-disk `cell_type` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Code => "code",
            CellKind::Markdown => "markdown",
            CellKind::Raw => "raw",
        }
    }

    /// Parse an on-disk `cell_type` tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "code" => Some(CellKind::Code),
            "markdown" => Some(CellKind::Markdown),
            "raw" => Some(CellKind::Raw),
            _ => None,
        }
    }
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cell source text in its stored representation.
///
/// Notebook files store source either as one string or as a list of line
/// fragments. The representation is kept so that saving reproduces the
/// original bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Source {
    /// The full source text.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Source::Text(text) => Cow::Borrowed(text),
            Source::Lines(lines) => Cow::Owned(lines.concat()),
        }
    }

    /// Whether the source contains only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Lines(Vec::new())
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::Text(text.to_string())
    }
}

/// Output captured from a code cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Text written to a named stream (`stdout` or `stderr`).
    Stream { name: String, text: String },

    /// Rich display data keyed by MIME type.
    ///
    /// `execution_count` is set when the output is the value of the cell's
    /// final expression rather than an explicit display call.
    Display {
        data: Attributes,
        metadata: Attributes,
        execution_count: Option<u32>,
    },

    /// Uncaught error raised by the cell.
    Error(CellError),
}

impl Output {
    /// Shorthand for a plain-text result value.
    pub fn text_result(text: impl Into<String>, execution_count: u32) -> Self {
        let mut data = Attributes::new();
        data.insert("text/plain".to_string(), Value::String(text.into()));
        Output::Display {
            data,
            metadata: Attributes::new(),
            execution_count: Some(execution_count),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Output::Error(_))
    }
}

/// One cell of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub source: Source,
    pub outputs: Vec<Output>,
    /// Execution counter recorded for code cells.
    pub execution_count: Option<u32>,
    /// Zero-based position of the cell within its document.
    pub sequence_index: usize,
    /// Fields the checker carries without interpreting.
    pub attributes: Attributes,
}

impl Cell {
    /// Create a code cell with no outputs.
    pub fn code(source: impl Into<Source>) -> Self {
        Self::new(CellKind::Code, source.into())
    }

    /// Create a markdown cell.
    pub fn markdown(source: impl Into<Source>) -> Self {
        Self::new(CellKind::Markdown, source.into())
    }

    fn new(kind: CellKind, source: Source) -> Self {
        Self {
            kind,
            source,
            outputs: Vec::new(),
            execution_count: None,
            sequence_index: 0,
            attributes: Attributes::new(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind == CellKind::Code
    }

    /// The recorded error output, if any.
    pub fn error(&self) -> Option<&CellError> {
        self.outputs.iter().find_map(|output| match output {
            Output::Error(error) => Some(error),
            _ => None,
        })
    }

    /// Drop outputs and the execution counter.
    pub fn clear_outputs(&mut self) {
        self.outputs.clear();
        self.execution_count = None;
    }
}

/// A notebook document: cells in order plus its storage path.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    pub cells: Vec<Cell>,
    /// Document-level fields the checker carries without interpreting.
    pub attributes: Attributes,
}

impl Document {
    /// Create a document, assigning each cell its sequence index.
    pub fn new(path: impl AsRef<Path>, cells: Vec<Cell>) -> Self {
        let mut document = Self {
            path: path.as_ref().to_path_buf(),
            cells,
            attributes: Attributes::new(),
        };
        document.reindex();
        document
    }

    /// Renumber `sequence_index` to match vector order.
    pub fn reindex(&mut self) {
        for (index, cell) in self.cells.iter_mut().enumerate() {
            cell.sequence_index = index;
        }
    }

    /// Iterate over code cells in order.
    pub fn code_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| cell.is_code())
    }

    /// Clear outputs of every code cell.
    pub fn clear_outputs(&mut self) {
        for cell in self.cells.iter_mut().filter(|cell| cell.is_code()) {
            cell.clear_outputs();
        }
    }

    /// Recorded errors as `(sequence_index, error)` pairs, in cell order.
    pub fn recorded_errors(&self) -> Vec<(usize, &CellError)> {
        self.code_cells()
            .flat_map(|cell| {
                cell.outputs.iter().filter_map(move |output| match output {
                    Output::Error(error) => Some((cell.sequence_index, error)),
                    _ => None,
                })
            })
            .collect()
    }

    /// File name for display, falling back to the full path.
    pub fn display_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assigns_sequence_indices() {
        let doc = Document::new(
            "a.ipynb",
            vec![Cell::markdown("# Title"), Cell::code("x = 1"), Cell::code("y = 2")],
        );
        let indices: Vec<_> = doc.cells.iter().map(|c| c.sequence_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(doc.code_cells().count(), 2);
    }

    #[test]
    fn test_source_lines_concatenate() {
        let source = Source::Lines(vec!["x = 1\n".to_string(), "y = x".to_string()]);
        assert_eq!(source.text(), "x = 1\ny = x");
        assert!(!source.is_blank());
        assert!(Source::Text("  \n".to_string()).is_blank());
    }

    #[test]
    fn test_recorded_errors_in_cell_order() {
        let mut first = Cell::code("a");
        first.outputs.push(Output::Error(CellError::new("NameError", "a")));
        let mut second = Cell::code("b");
        second
            .outputs
            .push(Output::Error(CellError::new("TypeError", "b")));
        let doc = Document::new("a.ipynb", vec![first, Cell::markdown("text"), second]);

        let errors = doc.recorded_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].0, 0);
        assert_eq!(errors[1].0, 2);
        assert_eq!(errors[1].1.name, "TypeError");
    }

    #[test]
    fn test_clear_outputs_only_touches_code_cells() {
        let mut code = Cell::code("1");
        code.outputs.push(Output::text_result("1", 1));
        code.execution_count = Some(1);
        let mut md = Cell::markdown("text");
        md.attributes
            .insert("id".to_string(), Value::String("m1".to_string()));
        let mut doc = Document::new("a.ipynb", vec![code, md.clone()]);

        doc.clear_outputs();
        assert!(doc.cells[0].outputs.is_empty());
        assert_eq!(doc.cells[0].execution_count, None);
        assert_eq!(doc.cells[1].attributes, md.attributes);
    }

    #[test]
    fn test_cell_kind_tags() {
        for kind in [CellKind::Code, CellKind::Markdown, CellKind::Raw] {
            assert_eq!(CellKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(CellKind::from_tag("heading"), None);
    }
}
