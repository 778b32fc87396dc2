//! Per-document results and the run-level summary.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Error;
use crate::kernel::CellError;

/// Longest error message shown for an execution failure.
pub const MAX_FAILURE_MESSAGE: usize = 200;

/// Longest error message shown for an error recorded in saved outputs.
pub const MAX_RECORDED_MESSAGE: usize = 100;

/// Outcome of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentStatus {
    Pass,
    Fail,
}

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The document file could not be parsed.
    Parse,
    /// A code cell raised while executing.
    CellExecution,
    /// The document could not be read or written.
    Io,
    /// An error output was found in previously saved outputs.
    RecordedError,
}

/// Error detail attached to a failed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub name: String,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Parse, "ParseError", message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Io, "IOError", message)
    }

    pub fn from_cell_error(kind: FailureKind, error: &CellError) -> Self {
        Self::new(kind, error.name.clone(), error.message.clone())
    }

    /// `Name: message`, with the message cut to `max_len` characters.
    pub fn describe(&self, max_len: usize) -> String {
        let message = truncate(&self.message, max_len);
        if message.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.name, message)
        }
    }

    fn display_limit(&self) -> usize {
        match self.kind {
            FailureKind::RecordedError => MAX_RECORDED_MESSAGE,
            _ => MAX_FAILURE_MESSAGE,
        }
    }
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        match err {
            Error::Parse(message) => Failure::parse(message.clone()),
            Error::CellExecution { error, .. } => {
                Failure::from_cell_error(FailureKind::CellExecution, error)
            }
            Error::Io(io) => Failure::io(io.to_string()),
            Error::Config(message) => Failure::new(FailureKind::Io, "ConfigError", message.clone()),
        }
    }
}

/// Cut `text` to at most `max_len` characters, marking the cut with `...`.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_len).collect();
        cut.push_str("...");
        cut
    }
}

/// A failure located at a specific cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellFailure {
    pub cell_index: usize,
    #[serde(flatten)]
    pub failure: Failure,
}

/// Pass/fail outcome of one document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentResult {
    path: PathBuf,
    status: DocumentStatus,
    failing_cell_index: Option<usize>,
    failure: Option<Failure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    additional_failures: Vec<CellFailure>,
}

impl DocumentResult {
    pub fn passed(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            status: DocumentStatus::Pass,
            failing_cell_index: None,
            failure: None,
            additional_failures: Vec::new(),
        }
    }

    /// Failure not attributable to a cell (parse or IO).
    pub fn failed(path: impl AsRef<Path>, failure: Failure) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            status: DocumentStatus::Fail,
            failing_cell_index: None,
            failure: Some(failure),
            additional_failures: Vec::new(),
        }
    }

    /// Failure raised by the cell at `index`.
    pub fn failed_at(path: impl AsRef<Path>, index: usize, failure: Failure) -> Self {
        Self {
            failing_cell_index: Some(index),
            ..Self::failed(path, failure)
        }
    }

    /// Convert an error caught at the document boundary.
    pub fn from_error(path: impl AsRef<Path>, err: &Error) -> Self {
        match err {
            Error::CellExecution { index, .. } => Self::failed_at(path, *index, err.into()),
            other => Self::failed(path, other.into()),
        }
    }

    /// Result of scanning saved outputs: PASS when nothing was recorded,
    /// otherwise FAIL at the first recorded error, keeping the rest.
    pub fn from_recorded(path: impl AsRef<Path>, mut recorded: Vec<CellFailure>) -> Self {
        if recorded.is_empty() {
            return Self::passed(path);
        }
        let first = recorded.remove(0);
        Self {
            additional_failures: recorded,
            ..Self::failed_at(path, first.cell_index, first.failure)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn is_pass(&self) -> bool {
        self.status == DocumentStatus::Pass
    }

    pub fn failing_cell_index(&self) -> Option<usize> {
        self.failing_cell_index
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn additional_failures(&self) -> &[CellFailure] {
        &self.additional_failures
    }

    /// Number of failures carried by this result.
    pub fn failure_count(&self) -> usize {
        usize::from(self.failure.is_some()) + self.additional_failures.len()
    }

    /// Human-readable lines, one per failure.
    pub fn failure_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let path = self.path.display();
        if let Some(failure) = &self.failure {
            let line = match self.failing_cell_index {
                Some(index) => format!(
                    "{}: cell {}: {}",
                    path,
                    index,
                    failure.describe(failure.display_limit())
                ),
                None => format!("{}: {}", path, failure.describe(failure.display_limit())),
            };
            lines.push(line);
        }
        for extra in &self.additional_failures {
            lines.push(format!(
                "{}: cell {}: {}",
                path,
                extra.cell_index,
                extra.failure.describe(extra.failure.display_limit())
            ));
        }
        lines
    }
}

/// Aggregate outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub results: Vec<DocumentResult>,
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True when every processed document passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Failure lines for every FAIL entry, in processing order.
    pub fn failure_lines(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|result| !result.is_pass())
            .flat_map(DocumentResult::failure_lines)
            .collect()
    }
}

/// Accumulates document results in processing order.
#[derive(Debug, Default)]
pub struct ResultCollector {
    results: Vec<DocumentResult>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: DocumentResult) {
        tracing::debug!(
            "Recorded {} for {}",
            match result.status() {
                DocumentStatus::Pass => "PASS",
                DocumentStatus::Fail => "FAIL",
            },
            result.path().display()
        );
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn summarize(&self) -> RunSummary {
        let passed = self.results.iter().filter(|r| r.is_pass()).count();
        RunSummary {
            results: self.results.clone(),
            passed,
            failed: self.results.len() - passed,
        }
    }
}
