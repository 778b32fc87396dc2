//! Sequential cell executor.
//!
//! Runs a document's code cells one at a time, in order, against a single
//! execution state created for that document. Stops at the first cell that
//! raises.

use crate::document::{Attributes, Cell, Document, Output};
use crate::error::Error;
use crate::kernel::{Capture, CellError, Kernel};
use crate::report::DocumentResult;

use super::context::ExecutionCallback;

/// Result of running one cell, inspected by the document loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellOutcome {
    /// Blank source; nothing was run.
    Skipped,
    /// The cell ran to completion.
    Completed,
    /// The cell raised; later cells must not run.
    Failed(CellError),
}

/// Executor that runs a document's code cells sequentially.
pub struct CellExecutor<K: Kernel> {
    /// Cell language runtime
    kernel: K,
    /// Execution callback for progress reporting
    callback: Option<Box<dyn ExecutionCallback>>,
}

impl<K: Kernel> CellExecutor<K> {
    /// Create a new executor for the given kernel.
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            callback: None,
        }
    }

    /// Set the execution callback for progress reporting.
    pub fn set_callback(&mut self, callback: impl ExecutionCallback + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Execute every code cell of `document` and return it with fresh
    /// outputs, together with its result.
    ///
    /// Existing outputs are cleared first, so cells after a failing cell
    /// end up with no outputs and no execution count.
    pub fn execute(&self, mut document: Document) -> (Document, DocumentResult) {
        document.clear_outputs();

        let mut order: Vec<usize> = document
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_code())
            .map(|(pos, _)| pos)
            .collect();
        order.sort_by_key(|&pos| document.cells[pos].sequence_index);

        if let Some(ref callback) = self.callback {
            callback.on_document_started(&document.path, order.len());
        }
        tracing::debug!(
            "Running {} with the {} kernel",
            document.path.display(),
            self.kernel.language()
        );

        // The state lives exactly as long as this document's run.
        let mut state = self.kernel.new_state();
        let mut execution_count = 0;
        let mut failure = None;

        for pos in order {
            let cell = &mut document.cells[pos];
            if let CellOutcome::Failed(error) = self.run_cell(&mut state, cell, &mut execution_count) {
                failure = Some(Error::CellExecution {
                    index: cell.sequence_index,
                    error,
                });
                break;
            }
        }
        drop(state);

        let result = match failure {
            Some(err) => {
                tracing::info!("{} failed: {}", document.path.display(), err);
                DocumentResult::from_error(&document.path, &err)
            }
            None => {
                tracing::info!("{} passed", document.path.display());
                DocumentResult::passed(&document.path)
            }
        };
        (document, result)
    }

    /// Run one code cell, replacing its outputs.
    ///
    /// `execution_count` is advanced for every cell that actually runs.
    pub fn run_cell(
        &self,
        state: &mut K::State,
        cell: &mut Cell,
        execution_count: &mut u32,
    ) -> CellOutcome {
        cell.clear_outputs();
        if cell.source.is_blank() {
            return CellOutcome::Skipped;
        }

        *execution_count += 1;
        let count = *execution_count;
        cell.execution_count = Some(count);

        if let Some(ref callback) = self.callback {
            callback.on_cell_started(cell.sequence_index, count);
        }

        let source = cell.source.text().into_owned();
        let mut capture = Capture::new();
        let result = self.kernel.run_cell(state, &source, &mut capture);
        cell.outputs = capture_outputs(capture, count);

        match result {
            Ok(()) => {
                if let Some(ref callback) = self.callback {
                    callback.on_cell_completed(cell.sequence_index);
                }
                CellOutcome::Completed
            }
            Err(error) => {
                if let Some(ref callback) = self.callback {
                    callback.on_cell_error(cell.sequence_index, &error);
                }
                // The error is always the last output of the cell.
                cell.outputs.push(Output::Error(error.clone()));
                CellOutcome::Failed(error)
            }
        }
    }
}

/// Convert captured text into document outputs.
fn capture_outputs(capture: Capture, execution_count: u32) -> Vec<Output> {
    let mut outputs = Vec::new();
    if !capture.stdout().is_empty() {
        outputs.push(Output::Stream {
            name: "stdout".to_string(),
            text: capture.stdout().to_string(),
        });
    }
    if !capture.stderr().is_empty() {
        outputs.push(Output::Stream {
            name: "stderr".to_string(),
            text: capture.stderr().to_string(),
        });
    }
    for text in capture.displays() {
        let mut data = Attributes::new();
        data.insert("text/plain".to_string(), text.clone().into());
        outputs.push(Output::Display {
            data,
            metadata: Attributes::new(),
            execution_count: None,
        });
    }
    if let Some(result) = capture.result() {
        outputs.push(Output::text_result(result, execution_count));
    }
    outputs
}
