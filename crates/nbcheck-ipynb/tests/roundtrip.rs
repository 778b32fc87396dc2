//! Integration tests for notebook persistence.
//!
//! Tests the full pipeline: load → execute → save, and read-only checks.

use std::fs;
use std::path::{Path, PathBuf};

use nbcheck_core::{CellExecutor, DocumentStatus, FailureKind, ScriptKernel};
use nbcheck_ipynb::{check, load, load_saved_outputs, recorded_errors, save};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Create a temporary directory for test artifacts.
fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write notebook");
    path
}

fn run_and_save(path: &Path) -> DocumentStatus {
    let executor = CellExecutor::new(ScriptKernel::new());
    let document = load(path).expect("Failed to load notebook");
    let (document, result) = executor.execute(document);
    save(&document).expect("Failed to save notebook");
    result.status()
}

/// An executed notebook exactly as this tool (and Jupyter) lays it out.
fn executed_notebook() -> &'static str {
    r##"{
 "cells": [
  {
   "cell_type": "markdown",
   "metadata": {},
   "source": [
    "# Tutorial\n",
    "Some text with unicode: 你好 🚀"
   ]
  },
  {
   "cell_type": "code",
   "execution_count": 1,
   "id": "c1",
   "metadata": {},
   "outputs": [],
   "source": [
    "x = 2\n",
    "y = x + 3"
   ]
  },
  {
   "cell_type": "code",
   "execution_count": 2,
   "metadata": {
    "tags": [
     "demo"
    ]
   },
   "outputs": [
    {
     "name": "stdout",
     "output_type": "stream",
     "text": [
      "5\n"
     ]
    }
   ],
   "source": "print(y)"
  },
  {
   "cell_type": "code",
   "execution_count": 3,
   "metadata": {},
   "outputs": [
    {
     "data": {
      "text/plain": [
       "[2, 5]"
      ]
     },
     "execution_count": 3,
     "metadata": {},
     "output_type": "execute_result"
    }
   ],
   "source": [
    "[x, y]"
   ]
  }
 ],
 "metadata": {
  "kernelspec": {
   "display_name": "Script",
   "language": "script",
   "name": "script"
  }
 },
 "nbformat": 4,
 "nbformat_minor": 5
}
"##
}

/// A notebook whose last cell fails, with stale outputs everywhere.
fn failing_notebook() -> &'static str {
    r#"{
 "cells": [
  {
   "cell_type": "code",
   "execution_count": 7,
   "metadata": {},
   "outputs": [
    {
     "name": "stdout",
     "output_type": "stream",
     "text": "stale\n"
    }
   ],
   "source": "x = 2"
  },
  {
   "cell_type": "code",
   "execution_count": null,
   "metadata": {},
   "outputs": [],
   "source": "assert x == 3, 'x should be 3'"
  },
  {
   "cell_type": "code",
   "execution_count": 9,
   "metadata": {},
   "outputs": [
    {
     "name": "stdout",
     "output_type": "stream",
     "text": "never\n"
    }
   ],
   "source": "print('never')"
  }
 ],
 "metadata": {},
 "nbformat": 4,
 "nbformat_minor": 5
}
"#
}

// =============================================================================
// Execute Mode
// =============================================================================

#[test]
fn test_executed_notebook_roundtrips_byte_for_byte() {
    let temp = temp_dir();
    let path = write(temp.path(), "tutorial.ipynb", executed_notebook());

    assert_eq!(run_and_save(&path), DocumentStatus::Pass);
    assert_eq!(fs::read_to_string(&path).unwrap(), executed_notebook());
}

#[test]
fn test_executing_twice_is_idempotent() {
    let temp = temp_dir();
    let path = write(temp.path(), "fail.ipynb", failing_notebook());

    run_and_save(&path);
    let first = fs::read(&path).unwrap();
    run_and_save(&path);
    let second = fs::read(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_failure_is_saved_on_failing_cell_only() {
    let temp = temp_dir();
    let path = write(temp.path(), "fail.ipynb", failing_notebook());

    assert_eq!(run_and_save(&path), DocumentStatus::Fail);

    let document = load(&path).unwrap();
    assert!(document.cells[0].outputs.is_empty());
    assert_eq!(document.cells[0].execution_count, Some(1));

    let error = document.cells[1].error().expect("error output saved");
    assert_eq!(error.name, "AssertionError");
    assert_eq!(error.message, "x should be 3");

    assert!(document.cells[2].outputs.is_empty());
    assert_eq!(document.cells[2].execution_count, None);

    // Source text keeps its single-string form.
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"source\": \"assert x == 3, 'x should be 3'\""));
}

// =============================================================================
// Check Mode
// =============================================================================

#[test]
fn test_check_reports_saved_errors_without_writing() {
    let temp = temp_dir();
    let path = write(temp.path(), "fail.ipynb", failing_notebook());
    run_and_save(&path);
    let before = fs::read(&path).unwrap();

    let result = check(&path);
    assert_eq!(result.status(), DocumentStatus::Fail);
    assert_eq!(result.failing_cell_index(), Some(1));
    assert_eq!(result.failure().unwrap().kind, FailureKind::RecordedError);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_check_passes_clean_notebook() {
    let temp = temp_dir();
    let path = write(temp.path(), "tutorial.ipynb", executed_notebook());

    let document = load_saved_outputs(&path).unwrap();
    assert!(recorded_errors(&document).is_empty());
    assert!(check(&path).is_pass());
}

#[test]
fn test_check_malformed_notebook_is_parse_failure() {
    let temp = temp_dir();
    let path = write(temp.path(), "broken.ipynb", "{\"cells\": [");

    let result = check(&path);
    assert_eq!(result.status(), DocumentStatus::Fail);
    assert_eq!(result.failing_cell_index(), None);
    assert_eq!(result.failure().unwrap().kind, FailureKind::Parse);
}
