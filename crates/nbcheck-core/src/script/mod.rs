//! Built-in script kernel.
//!
//! A small dynamically typed language for tutorial cells:
//!
//! ```text
//! x = 2
//! y = x + 3
//! xs = [x, y] * 2
//! print("total", sum(xs))
//! assert y == 5, "y should be 5"
//! ```
//!
//! Supported statements are assignment (plain, indexed and augmented),
//! `assert`, `raise Name("message")`, `del`, `pass` and bare expressions.
//! Values are `None`, booleans, 64-bit integers, floats, strings and lists.
//! Builtins: `print`, `display`, `len`, `str`, `int`, `float`, `bool`,
//! `abs`, `min`, `max`, `sum`, `range`.
//!
//! There are no loops or user-defined functions, so every cell terminates.

mod eval;
mod lexer;
mod parser;
mod value;

use rustc_hash::FxHashMap;

use crate::kernel::{Capture, CellError, Kernel};

pub use value::Value;

/// Bindings accumulated by running one document's cells.
///
/// Each document gets its own state; nothing is shared between documents.
#[derive(Debug, Default, Clone)]
pub struct ExecutionState {
    bindings: FxHashMap<String, Value>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.bindings.get_mut(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.bindings.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Kernel running the built-in script language in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptKernel;

impl ScriptKernel {
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for ScriptKernel {
    type State = ExecutionState;

    fn language(&self) -> &str {
        "script"
    }

    fn new_state(&self) -> ExecutionState {
        ExecutionState::new()
    }

    fn run_cell(
        &self,
        state: &mut ExecutionState,
        source: &str,
        capture: &mut Capture,
    ) -> Result<(), CellError> {
        let tokens = lexer::tokenize(source)?;
        let stmts = parser::parse(tokens)?;
        tracing::trace!(statements = stmts.len(), "parsed cell");
        eval::Interpreter::new(state, capture).run(&stmts, source)
    }
}
