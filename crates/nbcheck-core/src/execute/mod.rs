//! Execution engine for nbcheck documents.
//!
//! # Architecture
//!
//! ```text
//! Document
//!     │
//!     └── CellExecutor
//!             │
//!             ├── Kernel::new_state()   fresh ExecutionState per document
//!             │
//!             └── for each code cell, in order
//!                     └── Kernel::run_cell() → CellOutcome
//!                             ├── Completed → record outputs, continue
//!                             └── Failed    → record error output, stop
//! ```
//!
//! # Module Structure
//!
//! - `context` - Execution callbacks for progress reporting
//! - `executor` - CellExecutor for sequential execution

mod context;
mod executor;

pub use context::{ExecutionCallback, LoggingCallback};
pub use executor::{CellExecutor, CellOutcome};
