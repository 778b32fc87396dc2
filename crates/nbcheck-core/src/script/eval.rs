//! Tree-walking evaluator for the script language.

use std::cmp::Ordering;

use crate::kernel::{Capture, CellError};

use super::ExecutionState;
use super::parser::{BinOp, CmpOp, Expr, Stmt, StmtKind, Target};
use super::value::Value;

type EvalResult<T> = Result<T, CellError>;

fn type_error(message: impl Into<String>) -> CellError {
    CellError::new("TypeError", message)
}

fn name_error(name: &str) -> CellError {
    CellError::new("NameError", format!("name '{}' is not defined", name))
}

fn overflow() -> CellError {
    CellError::new("OverflowError", "integer overflow")
}

/// Largest list or string (in elements) a single operation may build.
pub const MAX_SEQUENCE_LEN: usize = 10_000_000;

fn memory_error(what: &str) -> CellError {
    CellError::new(
        "MemoryError",
        format!("{} would exceed {} elements", what, MAX_SEQUENCE_LEN),
    )
}

fn zero_division(message: &str) -> CellError {
    CellError::new("ZeroDivisionError", message)
}

/// Runs parsed statements against one document's state.
pub struct Interpreter<'a> {
    state: &'a mut ExecutionState,
    capture: &'a mut Capture,
}

impl<'a> Interpreter<'a> {
    pub fn new(state: &'a mut ExecutionState, capture: &'a mut Capture) -> Self {
        Self { state, capture }
    }

    /// Execute statements in order, stopping at the first error.
    ///
    /// If the final statement is an expression whose value is not `None`,
    /// its representation becomes the cell's result.
    pub fn run(&mut self, stmts: &[Stmt], source: &str) -> EvalResult<()> {
        let last = stmts.len().checked_sub(1);
        for (i, stmt) in stmts.iter().enumerate() {
            self.exec(stmt, Some(i) == last)
                .map_err(|err| err.with_location(location(source, stmt.line)))?;
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt, is_last: bool) -> EvalResult<()> {
        match &stmt.kind {
            StmtKind::Pass => {}
            StmtKind::Expr(expr) => {
                let value = self.eval(expr)?;
                if is_last && value != Value::None {
                    self.capture.set_result(value.repr());
                }
            }
            StmtKind::Assign(target, expr) => {
                let value = self.eval(expr)?;
                self.assign(target, value)?;
            }
            StmtKind::AugAssign(target, op, expr) => {
                let current = match target {
                    Target::Name(name) => self.lookup(name)?,
                    Target::Index(name, index) => {
                        let base = self.lookup(name)?;
                        let index = self.eval(index)?;
                        subscript(&base, &index)?
                    }
                };
                let rhs = self.eval(expr)?;
                let value = binary(*op, &current, &rhs)?;
                self.assign(target, value)?;
            }
            StmtKind::Assert(test, message) => {
                if !self.eval(test)?.is_truthy() {
                    let message = match message {
                        Some(expr) => self.eval(expr)?.to_string(),
                        None => String::new(),
                    };
                    return Err(CellError::new("AssertionError", message));
                }
            }
            StmtKind::Raise(None) => {
                return Err(CellError::new(
                    "RuntimeError",
                    "No active exception to reraise",
                ));
            }
            StmtKind::Raise(Some((name, message))) => {
                let message = match message {
                    Some(expr) => self.eval(expr)?.to_string(),
                    None => String::new(),
                };
                return Err(CellError::new(name.clone(), message));
            }
            StmtKind::Del(names) => {
                for name in names {
                    if self.state.remove(name).is_none() {
                        return Err(name_error(name));
                    }
                }
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        self.state.get(name).cloned().ok_or_else(|| name_error(name))
    }

    fn assign(&mut self, target: &Target, value: Value) -> EvalResult<()> {
        match target {
            Target::Name(name) => {
                self.state.set(name.clone(), value);
                Ok(())
            }
            Target::Index(name, index) => {
                let index = self.eval(index)?;
                match self.state.get_mut(name) {
                    Some(Value::List(items)) => {
                        let slot = list_index(items.len(), &index, "list assignment index")?;
                        items[slot] = value;
                        Ok(())
                    }
                    Some(other) => Err(type_error(format!(
                        "'{}' object does not support item assignment",
                        other.type_name()
                    ))),
                    None => Err(name_error(name)),
                }
            }
        }
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List),
            Expr::Name(name) => self.lookup(name),
            Expr::Neg(inner) => negate(&self.eval(inner)?),
            Expr::Pos(inner) => {
                let value = self.eval(inner)?;
                match value {
                    Value::Bool(b) => Ok(Value::Int(i64::from(b))),
                    Value::Int(_) | Value::Float(_) => Ok(value),
                    other => Err(type_error(format!(
                        "bad operand type for unary +: '{}'",
                        other.type_name()
                    ))),
                }
            }
            Expr::Not(inner) => Ok(Value::Bool(!self.eval(inner)?.is_truthy())),
            Expr::Binary(left, op, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, &left, &right)
            }
            Expr::Compare(first, rest) => {
                let mut left = self.eval(first)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Index(base, index) => {
                let base = self.eval(base)?;
                let index = self.eval(index)?;
                subscript(&base, &index)
            }
            Expr::Call(name, args) => {
                if let Some(value) = self.state.get(name) {
                    return Err(type_error(format!(
                        "'{}' object is not callable",
                        value.type_name()
                    )));
                }
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.call(name, args)
            }
        }
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> EvalResult<Value> {
        match name {
            "print" => {
                let line = args
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                self.capture.write_stdout(&line);
                self.capture.write_stdout("\n");
                Ok(Value::None)
            }
            "display" => {
                for arg in &args {
                    self.capture.display(arg.repr());
                }
                Ok(Value::None)
            }
            "len" => {
                let [value] = exactly::<1>(name, args)?;
                match value {
                    Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                    Value::List(items) => Ok(Value::Int(items.len() as i64)),
                    other => Err(type_error(format!(
                        "object of type '{}' has no len()",
                        other.type_name()
                    ))),
                }
            }
            "str" => {
                let [value] = exactly::<1>(name, args)?;
                Ok(Value::Str(value.to_string()))
            }
            "bool" => {
                let [value] = exactly::<1>(name, args)?;
                Ok(Value::Bool(value.is_truthy()))
            }
            "int" => {
                let [value] = exactly::<1>(name, args)?;
                to_int(value)
            }
            "float" => {
                let [value] = exactly::<1>(name, args)?;
                to_float(value)
            }
            "abs" => {
                let [value] = exactly::<1>(name, args)?;
                match value {
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => match other.as_int() {
                        Some(i) => i.checked_abs().map(Value::Int).ok_or_else(overflow),
                        None => Err(type_error(format!(
                            "bad operand type for abs(): '{}'",
                            other.type_name()
                        ))),
                    },
                }
            }
            "min" | "max" => {
                let items = match args.len() {
                    0 => {
                        return Err(type_error(format!(
                            "{} expected at least 1 argument, got 0",
                            name
                        )));
                    }
                    1 => match args.into_iter().next() {
                        Some(Value::List(items)) => items,
                        Some(other) => {
                            return Err(type_error(format!(
                                "'{}' object is not iterable",
                                other.type_name()
                            )));
                        }
                        None => Vec::new(),
                    },
                    _ => args,
                };
                let wanted = if name == "min" {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let mut iter = items.into_iter();
                let mut best = iter.next().ok_or_else(|| {
                    CellError::new("ValueError", format!("{}() arg is an empty sequence", name))
                })?;
                for item in iter {
                    if item.compare(&best, if name == "min" { "<" } else { ">" })? == wanted {
                        best = item;
                    }
                }
                Ok(best)
            }
            "sum" => {
                let [value] = exactly::<1>(name, args)?;
                match value {
                    Value::List(items) => items
                        .iter()
                        .try_fold(Value::Int(0), |acc, item| binary(BinOp::Add, &acc, item)),
                    other => Err(type_error(format!(
                        "'{}' object is not iterable",
                        other.type_name()
                    ))),
                }
            }
            "range" => range(args),
            _ => Err(name_error(name)),
        }
    }
}

/// Trace line pointing at the statement that raised.
fn location(source: &str, line: usize) -> String {
    let text = source.lines().nth(line.saturating_sub(1)).unwrap_or("").trim();
    format!("line {}: {}", line, text)
}

fn exactly<const N: usize>(name: &str, args: Vec<Value>) -> EvalResult<[Value; N]> {
    let given = args.len();
    args.try_into().map_err(|_| {
        type_error(format!(
            "{}() takes exactly {} argument{} ({} given)",
            name,
            N,
            if N == 1 { "" } else { "s" },
            given
        ))
    })
}

fn to_int(value: Value) -> EvalResult<Value> {
    match value {
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Float(f) => Err(CellError::new(
            "OverflowError",
            format!("cannot convert float {} to integer", f),
        )),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            CellError::new(
                "ValueError",
                format!("invalid literal for int() with base 10: {}", Value::Str(s).repr()),
            )
        }),
        other => other.as_int().map(Value::Int).ok_or_else(|| {
            type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn to_float(value: Value) -> EvalResult<Value> {
    match value {
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            CellError::new(
                "ValueError",
                format!("could not convert string to float: {}", Value::Str(s).repr()),
            )
        }),
        other => other.as_float().map(Value::Float).ok_or_else(|| {
            type_error(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn range(args: Vec<Value>) -> EvalResult<Value> {
    let ints = args
        .iter()
        .map(|arg| {
            arg.as_int().ok_or_else(|| {
                type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    arg.type_name()
                ))
            })
        })
        .collect::<EvalResult<Vec<_>>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(type_error(format!(
                "range expected 1 to 3 arguments, got {}",
                ints.len()
            )));
        }
    };
    if step == 0 {
        return Err(CellError::new("ValueError", "range() arg 3 must not be zero"));
    }
    let (start_wide, stop_wide, step_wide) = (start as i128, stop as i128, step as i128);
    let len = if step > 0 && start < stop {
        (stop_wide - start_wide - 1) / step_wide + 1
    } else if step < 0 && start > stop {
        (start_wide - stop_wide - 1) / -step_wide + 1
    } else {
        0
    };
    if len > MAX_SEQUENCE_LEN as i128 {
        return Err(memory_error("range()"));
    }
    let mut items = Vec::with_capacity(len as usize);
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        items.push(Value::Int(current));
        current = match current.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::List(items))
}

fn negate(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Float(f) => Ok(Value::Float(-f)),
        other => match other.as_int() {
            Some(i) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
            None => Err(type_error(format!(
                "bad operand type for unary -: '{}'",
                other.type_name()
            ))),
        },
    }
}

/// Convert an index value to a position, allowing negative indices.
fn list_index(len: usize, index: &Value, what: &str) -> EvalResult<usize> {
    let Some(raw) = index.as_int() else {
        return Err(type_error(format!(
            "list indices must be integers, not {}",
            index.type_name()
        )));
    };
    let len = len as i64;
    let pos = if raw < 0 { raw + len } else { raw };
    if pos < 0 || pos >= len {
        return Err(CellError::new(
            "IndexError",
            format!("{} out of range", what),
        ));
    }
    Ok(pos as usize)
}

fn subscript(base: &Value, index: &Value) -> EvalResult<Value> {
    match base {
        Value::List(items) => {
            let pos = list_index(items.len(), index, "list index")?;
            Ok(items[pos].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let pos = list_index(chars.len(), index, "string index")?;
            Ok(Value::Str(chars[pos].to_string()))
        }
        other => Err(type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn unsupported(op: BinOp, left: &Value, right: &Value) -> CellError {
    type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

/// Repetition count for `len`-element sequence `times` over, within the cap.
fn repeat_count(len: usize, times: i64, what: &str) -> EvalResult<usize> {
    let times = usize::try_from(times).unwrap_or(0);
    match len.checked_mul(times) {
        Some(total) if total <= MAX_SEQUENCE_LEN => Ok(times),
        _ => Err(memory_error(what)),
    }
}

fn repeat<T: Clone>(items: &[T], times: i64) -> EvalResult<Vec<T>> {
    let times = repeat_count(items.len(), times, "list repetition")?;
    let mut out = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    Ok(out)
}

pub(crate) fn binary(op: BinOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) if op == BinOp::Add => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::List(a), Value::List(b)) if op == BinOp::Add => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (Value::Str(s), n) | (n, Value::Str(s)) if op == BinOp::Mul && n.as_int().is_some() => {
            let times = repeat_count(s.len(), n.as_int().unwrap_or(0), "string repetition")?;
            Ok(Value::Str(s.repeat(times)))
        }
        (Value::List(items), n) | (n, Value::List(items))
            if op == BinOp::Mul && n.as_int().is_some() =>
        {
            repeat(items, n.as_int().unwrap_or(0)).map(Value::List)
        }
        (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_int(), b.as_int()) {
            (Some(x), Some(y)) => int_binary(op, x, y),
            _ => float_binary(
                op,
                a.as_float().unwrap_or_default(),
                b.as_float().unwrap_or_default(),
            ),
        },
        _ => Err(unsupported(op, left, right)),
    }
}

fn int_binary(op: BinOp, x: i64, y: i64) -> EvalResult<Value> {
    let value = match op {
        BinOp::Add => x.checked_add(y).ok_or_else(overflow)?,
        BinOp::Sub => x.checked_sub(y).ok_or_else(overflow)?,
        BinOp::Mul => x.checked_mul(y).ok_or_else(overflow)?,
        BinOp::Div => {
            if y == 0 {
                return Err(zero_division("division by zero"));
            }
            return Ok(Value::Float(x as f64 / y as f64));
        }
        BinOp::FloorDiv => {
            if y == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            let q = x.checked_div(y).ok_or_else(overflow)?;
            if x % y != 0 && ((x < 0) != (y < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinOp::Mod => {
            if y == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            let r = x.checked_rem(y).ok_or_else(overflow)?;
            if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r }
        }
        BinOp::Pow => {
            if y < 0 {
                if x == 0 {
                    return Err(zero_division("0.0 cannot be raised to a negative power"));
                }
                return Ok(Value::Float((x as f64).powf(y as f64)));
            }
            let exp = u32::try_from(y).map_err(|_| overflow())?;
            x.checked_pow(exp).ok_or_else(overflow)?
        }
    };
    Ok(Value::Int(value))
}

fn float_binary(op: BinOp, x: f64, y: f64) -> EvalResult<Value> {
    let value = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => {
            if y == 0.0 {
                return Err(zero_division("float division by zero"));
            }
            x / y
        }
        BinOp::FloorDiv => {
            if y == 0.0 {
                return Err(zero_division("float floor division by zero"));
            }
            (x / y).floor()
        }
        BinOp::Mod => {
            if y == 0.0 {
                return Err(zero_division("float modulo"));
            }
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) { r + y } else { r }
        }
        BinOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(zero_division("0.0 cannot be raised to a negative power"));
            }
            x.powf(y)
        }
    };
    Ok(Value::Float(value))
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> EvalResult<bool> {
    match op {
        CmpOp::Eq => Ok(left.loose_eq(right)),
        CmpOp::NotEq => Ok(!left.loose_eq(right)),
        CmpOp::Lt => Ok(left.compare(right, op.symbol())? == Ordering::Less),
        CmpOp::LtEq => Ok(left.compare(right, op.symbol())? != Ordering::Greater),
        CmpOp::Gt => Ok(left.compare(right, op.symbol())? == Ordering::Greater),
        CmpOp::GtEq => Ok(left.compare(right, op.symbol())? != Ordering::Less),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => contains(right, left).map(|found| !found),
    }
}

fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match (container, item) {
        (Value::List(items), item) => Ok(items.iter().any(|x| x.loose_eq(item))),
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::Str(_), other) => Err(type_error(format!(
            "'in <string>' requires string as left operand, not {}",
            other.type_name()
        ))),
        (other, _) => Err(type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}
