//! Jupyter notebook support for nbcheck.
//!
//! Reads `.ipynb` files into the core document model and writes executed
//! documents back in the layout Jupyter itself produces.
//!
//! # Architecture
//!
//! ```text
//! discover(root) ──► [paths] ──► load ──► Document ──► (execute) ──► save
//!                                  │
//!                                  ▼
//!                    load_saved_outputs ──► recorded_errors ──► DocumentResult
//! ```

mod discover;
mod error;
mod ipynb;
mod loader;
mod writer;

pub use discover::{CHECKPOINT_DIR, discover, is_notebook};
pub use error::{FormatError, FormatResult};
pub use ipynb::{CellOutput, JupyterCell, JupyterNotebook, MultilineString, NBFORMAT};
pub use loader::{check, load, load_saved_outputs, parse_document, recorded_errors};
pub use writer::{save, to_json_string};
