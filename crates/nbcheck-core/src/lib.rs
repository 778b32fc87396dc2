//! Core engine for nbcheck.
//!
//! This crate provides:
//! - The in-memory document model
//! - The `Kernel` seam and the built-in script kernel
//! - Sequential, fail-fast cell execution with per-document state
//! - Result collection and the run summary

pub mod config;
pub mod document;
pub mod error;
pub mod execute;
pub mod kernel;
pub mod report;
pub mod script;

pub use config::{RunConfig, RunMode, Scope};
pub use document::{Attributes, Cell, CellKind, Document, Output, Source};
pub use error::{Error, Result};
pub use execute::{CellExecutor, CellOutcome, ExecutionCallback, LoggingCallback};
pub use kernel::{Capture, CellError, Kernel};
pub use report::{
    CellFailure, DocumentResult, DocumentStatus, Failure, FailureKind, MAX_FAILURE_MESSAGE,
    MAX_RECORDED_MESSAGE, ResultCollector, RunSummary,
};
pub use script::{ExecutionState, ScriptKernel, Value};
