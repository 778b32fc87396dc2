//! Execution callbacks for nbcheck cells.

use std::path::Path;

use crate::kernel::CellError;

/// Callback trait for execution progress reporting.
pub trait ExecutionCallback {
    /// Called when a document starts executing.
    fn on_document_started(&self, _path: &Path, _code_cells: usize) {}

    /// Called when a cell starts executing.
    fn on_cell_started(&self, index: usize, execution_count: u32);

    /// Called when a cell completes successfully.
    fn on_cell_completed(&self, index: usize);

    /// Called when a cell raises.
    fn on_cell_error(&self, index: usize, error: &CellError);
}

/// Callback that forwards progress to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCallback;

impl ExecutionCallback for LoggingCallback {
    fn on_document_started(&self, path: &Path, code_cells: usize) {
        tracing::debug!("Executing {} ({} code cells)", path.display(), code_cells);
    }

    fn on_cell_started(&self, index: usize, execution_count: u32) {
        tracing::debug!("  cell {} [{}] started", index, execution_count);
    }

    fn on_cell_completed(&self, index: usize) {
        tracing::debug!("  cell {} completed", index);
    }

    fn on_cell_error(&self, index: usize, error: &CellError) {
        tracing::debug!("  cell {} raised {}", index, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl ExecutionCallback for Recorder {
        fn on_cell_started(&self, index: usize, execution_count: u32) {
            self.events
                .borrow_mut()
                .push(format!("start {} {}", index, execution_count));
        }

        fn on_cell_completed(&self, index: usize) {
            self.events.borrow_mut().push(format!("done {}", index));
        }

        fn on_cell_error(&self, index: usize, error: &CellError) {
            self.events
                .borrow_mut()
                .push(format!("error {} {}", index, error.name));
        }
    }

    #[test]
    fn test_default_document_hook_is_noop() {
        let recorder = Recorder::default();
        recorder.on_document_started(Path::new("a.ipynb"), 3);
        assert!(recorder.events.borrow().is_empty());
    }

    #[test]
    fn test_recorder_sees_events() {
        let recorder = Recorder::default();
        recorder.on_cell_started(0, 1);
        recorder.on_cell_error(0, &CellError::new("NameError", "x"));
        assert_eq!(
            *recorder.events.borrow(),
            vec!["start 0 1".to_string(), "error 0 NameError".to_string()]
        );
    }
}
