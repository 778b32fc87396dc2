//! The seam between the executor and a cell language.
//!
//! A [`Kernel`] knows how to create a fresh execution state for a document
//! and how to run one cell's source against that state. The executor owns
//! the state for the duration of one document and drops it afterwards.

use serde::{Deserialize, Serialize};

/// An uncaught error raised while running a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellError {
    /// Error class name, e.g. `NameError`.
    pub name: String,
    /// Error message.
    pub message: String,
    /// Trace lines, outermost first.
    pub trace: Vec<String>,
}

impl CellError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let trace = vec![format!("{}: {}", name, message)];
        Self {
            name,
            message,
            trace,
        }
    }

    /// Prepend a trace line locating the error.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.trace.insert(0, location.into());
        self
    }
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl std::error::Error for CellError {}

/// Output produced by one cell run.
///
/// Kernels write into this while running; the executor turns it into
/// document outputs afterwards. Anything captured before an error is kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Capture {
    stdout: String,
    stderr: String,
    displays: Vec<String>,
    result: Option<String>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text to standard output.
    pub fn write_stdout(&mut self, text: &str) {
        self.stdout.push_str(text);
    }

    /// Append text to standard error.
    pub fn write_stderr(&mut self, text: &str) {
        self.stderr.push_str(text);
    }

    /// Record an explicit plain-text display.
    pub fn display(&mut self, text: impl Into<String>) {
        self.displays.push(text.into());
    }

    /// Record the value of the cell's final expression.
    pub fn set_result(&mut self, text: impl Into<String>) {
        self.result = Some(text.into());
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn displays(&self) -> &[String] {
        &self.displays
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty()
            && self.stderr.is_empty()
            && self.displays.is_empty()
            && self.result.is_none()
    }
}

/// A cell language runtime.
pub trait Kernel {
    /// Per-document execution state.
    type State;

    /// Language name, recorded in logs.
    fn language(&self) -> &str;

    /// Create a fresh, empty state for one document.
    fn new_state(&self) -> Self::State;

    /// Run one cell's source against `state`.
    ///
    /// Bindings made by a successful run must be visible to later calls
    /// with the same state.
    fn run_cell(
        &self,
        state: &mut Self::State,
        source: &str,
        capture: &mut Capture,
    ) -> Result<(), CellError>;
}
