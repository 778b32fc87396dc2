//! Recursive-descent parser for the script language.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! stmt    := "pass" | "del" NAME ("," NAME)* | "assert" expr ("," expr)?
//!          | "raise" (NAME ("(" expr? ")")?)? | target ("=" | op"=") expr | expr
//! expr    := or
//! or      := and ("or" and)*
//! and     := not ("and" not)*
//! not     := "not" not | compare
//! compare := sum (("==" | "!=" | "<" | "<=" | ">" | ">=" | "in" | "not" "in") sum)*
//! sum     := term (("+" | "-") term)*
//! term    := unary (("*" | "/" | "//" | "%") unary)*
//! unary   := ("-" | "+") unary | power
//! power   := postfix ("**" unary)?
//! postfix := atom ("(" args ")" | "[" expr "]")*
//! ```

use crate::kernel::CellError;

use super::lexer::{Tok, Token, syntax_error};

/// Deepest bracket, `not` or unary-sign nesting accepted in one expression.
pub const MAX_NESTING: usize = 100;

/// Deepest expression tree accepted, counting operator chains.
pub const MAX_DEPTH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtEq => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtEq => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Expr>),
    Name(String),
    Neg(Box<Expr>),
    Pos(Box<Expr>),
    Not(Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
    /// Chained comparison: `a < b < c` keeps every operand.
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Index(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(String),
    Index(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assign(Target, Expr),
    AugAssign(Target, BinOp, Expr),
    Assert(Expr, Option<Expr>),
    Raise(Option<(String, Option<Expr>)>),
    Del(Vec<String>),
    Pass,
    Expr(Expr),
}

/// A statement with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

/// Parse a token stream into statements.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Stmt>, CellError> {
    Parser {
        tokens,
        pos: 0,
        nesting: 0,
        depth: 0,
    }
    .program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Recursive descents currently open.
    nesting: usize,
    /// Upper bound on the depth of the tree being built.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].tok
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].tok
    }

    fn line(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].line
    }

    fn advance(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok, what: &str) -> Result<(), CellError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn error(&self, message: impl Into<String>) -> CellError {
        syntax_error(self.line(), message)
    }

    /// Account for one more tree level.
    fn deepen(&mut self) -> Result<(), CellError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(self.error("expression too deeply nested"))
        } else {
            Ok(())
        }
    }

    /// Run `parse` one recursion level down.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, CellError>,
    ) -> Result<T, CellError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error("too many nested parentheses"));
        }
        self.nesting += 1;
        self.deepen()?;
        let result = parse(self);
        self.nesting -= 1;
        self.depth -= 1;
        result
    }

    fn program(mut self) -> Result<Vec<Stmt>, CellError> {
        let mut stmts = Vec::new();
        while *self.peek() != Tok::Eof {
            if self.eat(&Tok::Newline) {
                continue;
            }
            stmts.push(self.statement()?);
            if !self.eat(&Tok::Newline) {
                return Err(self.error("invalid syntax"));
            }
        }
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt, CellError> {
        let line = self.line();
        let kind = match self.peek() {
            Tok::Pass => {
                self.advance();
                StmtKind::Pass
            }
            Tok::Del => {
                self.advance();
                let mut names = vec![self.name()?];
                while self.eat(&Tok::Comma) {
                    names.push(self.name()?);
                }
                StmtKind::Del(names)
            }
            Tok::Assert => {
                self.advance();
                let test = self.expr()?;
                let message = if self.eat(&Tok::Comma) {
                    Some(self.expr()?)
                } else {
                    None
                };
                StmtKind::Assert(test, message)
            }
            Tok::Raise => {
                self.advance();
                if *self.peek() == Tok::Newline {
                    StmtKind::Raise(None)
                } else {
                    let name = self.name()?;
                    let message = if self.eat(&Tok::LParen) {
                        let message = if *self.peek() == Tok::RParen {
                            None
                        } else {
                            Some(self.expr()?)
                        };
                        self.expect(&Tok::RParen, "')'")?;
                        message
                    } else {
                        None
                    };
                    StmtKind::Raise(Some((name, message)))
                }
            }
            _ => self.assignment_or_expr()?,
        };
        Ok(Stmt { kind, line })
    }

    fn assignment_or_expr(&mut self) -> Result<StmtKind, CellError> {
        let expr = self.expr()?;
        let aug = match self.peek() {
            Tok::Assign => None,
            Tok::PlusAssign => Some(BinOp::Add),
            Tok::MinusAssign => Some(BinOp::Sub),
            Tok::StarAssign => Some(BinOp::Mul),
            Tok::SlashAssign => Some(BinOp::Div),
            _ => return Ok(StmtKind::Expr(expr)),
        };
        self.advance();
        let target = match expr {
            Expr::Name(name) => Target::Name(name),
            Expr::Index(base, index) => match *base {
                Expr::Name(name) => Target::Index(name, *index),
                _ => return Err(self.error("cannot assign to expression")),
            },
            _ => return Err(self.error("cannot assign to expression")),
        };
        let value = self.expr()?;
        Ok(match aug {
            None => StmtKind::Assign(target, value),
            Some(op) => StmtKind::AugAssign(target, op, value),
        })
    }

    fn name(&mut self) -> Result<String, CellError> {
        match self.advance() {
            Tok::Name(name) => Ok(name),
            _ => Err(self.error("expected a name")),
        }
    }

    fn expr(&mut self) -> Result<Expr, CellError> {
        self.nested(Self::or)
    }

    fn or(&mut self) -> Result<Expr, CellError> {
        let mut left = self.and()?;
        let mut levels = 0;
        while self.eat(&Tok::Or) {
            self.deepen()?;
            levels += 1;
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.depth -= levels;
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, CellError> {
        let mut left = self.not()?;
        let mut levels = 0;
        while self.eat(&Tok::And) {
            self.deepen()?;
            levels += 1;
            let right = self.not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.depth -= levels;
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr, CellError> {
        if self.eat(&Tok::Not) {
            Ok(Expr::Not(Box::new(self.nested(Self::not)?)))
        } else {
            self.compare()
        }
    }

    fn compare(&mut self) -> Result<Expr, CellError> {
        let first = self.sum()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Tok::Eq => CmpOp::Eq,
                Tok::NotEq => CmpOp::NotEq,
                Tok::Lt => CmpOp::Lt,
                Tok::LtEq => CmpOp::LtEq,
                Tok::Gt => CmpOp::Gt,
                Tok::GtEq => CmpOp::GtEq,
                Tok::In => CmpOp::In,
                Tok::Not if *self.peek_at(1) == Tok::In => {
                    self.advance();
                    CmpOp::NotIn
                }
                _ => break,
            };
            self.advance();
            rest.push((op, self.sum()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn sum(&mut self) -> Result<Expr, CellError> {
        let mut left = self.term()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            levels += 1;
            let right = self.term()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        self.depth -= levels;
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, CellError> {
        let mut left = self.unary()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::DoubleSlash => BinOp::FloorDiv,
                Tok::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            levels += 1;
            let right = self.unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        self.depth -= levels;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, CellError> {
        if self.eat(&Tok::Minus) {
            Ok(Expr::Neg(Box::new(self.nested(Self::unary)?)))
        } else if self.eat(&Tok::Plus) {
            Ok(Expr::Pos(Box::new(self.nested(Self::unary)?)))
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> Result<Expr, CellError> {
        let base = self.postfix()?;
        if self.eat(&Tok::DoubleStar) {
            // Right-associative, and binds tighter than a unary minus on its left.
            let exponent = self.nested(Self::unary)?;
            Ok(Expr::Binary(Box::new(base), BinOp::Pow, Box::new(exponent)))
        } else {
            Ok(base)
        }
    }

    fn postfix(&mut self) -> Result<Expr, CellError> {
        let mut expr = self.atom()?;
        let mut levels = 0;
        loop {
            if *self.peek() == Tok::LParen {
                let Expr::Name(name) = expr else {
                    return Err(self.error("only named functions can be called"));
                };
                self.advance();
                let args = self.sequence(&Tok::RParen, "')'")?;
                expr = Expr::Call(name, args);
            } else if self.eat(&Tok::LBracket) {
                self.deepen()?;
                levels += 1;
                let index = self.expr()?;
                self.expect(&Tok::RBracket, "']'")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                self.depth -= levels;
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`, allowing a trailing comma.
    fn sequence(&mut self, close: &Tok, what: &str) -> Result<Vec<Expr>, CellError> {
        let mut items = Vec::new();
        while self.peek() != close {
            items.push(self.expr()?);
            if !self.eat(&Tok::Comma) {
                break;
            }
        }
        self.expect(close, what)?;
        Ok(items)
    }

    fn atom(&mut self) -> Result<Expr, CellError> {
        let expr = match self.advance() {
            Tok::Int(value) => Expr::Int(value),
            Tok::Float(value) => Expr::Float(value),
            Tok::Str(mut text) => {
                // Adjacent string literals concatenate.
                while let Tok::Str(next) = self.peek() {
                    text.push_str(next);
                    self.advance();
                }
                Expr::Str(text)
            }
            Tok::True => Expr::Bool(true),
            Tok::False => Expr::Bool(false),
            Tok::None => Expr::None,
            Tok::Name(name) => Expr::Name(name),
            Tok::LParen => {
                let inner = self.expr()?;
                self.expect(&Tok::RParen, "')'")?;
                inner
            }
            Tok::LBracket => Expr::List(self.sequence(&Tok::RBracket, "']'")?),
            _ => return Err(self.error("invalid syntax")),
        };
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::tokenize;

    fn parse_src(source: &str) -> Vec<Stmt> {
        parse(tokenize(source).unwrap()).unwrap()
    }

    fn parse_err(source: &str) -> CellError {
        parse(tokenize(source).unwrap()).unwrap_err()
    }

    #[test]
    fn test_assignment_and_expression() {
        let stmts = parse_src("x = 2\ny = x + 3");
        assert_eq!(stmts.len(), 2);
        assert_eq!(
            stmts[0].kind,
            StmtKind::Assign(Target::Name("x".into()), Expr::Int(2))
        );
        assert_eq!(stmts[1].line, 2);
    }

    #[test]
    fn test_precedence() {
        let stmts = parse_src("1 + 2 * 3");
        let StmtKind::Expr(Expr::Binary(left, BinOp::Add, right)) = &stmts[0].kind else {
            panic!("expected addition at the top");
        };
        assert_eq!(**left, Expr::Int(1));
        assert!(matches!(**right, Expr::Binary(_, BinOp::Mul, _)));
    }

    #[test]
    fn test_power_binds_tighter_than_negation() {
        let stmts = parse_src("-2 ** 2");
        assert!(matches!(
            &stmts[0].kind,
            StmtKind::Expr(Expr::Neg(inner)) if matches!(**inner, Expr::Binary(_, BinOp::Pow, _))
        ));
    }

    #[test]
    fn test_assert_with_message() {
        let stmts = parse_src("assert y == 5, 'y should be 5'");
        let StmtKind::Assert(Expr::Compare(_, ops), Some(Expr::Str(msg))) = &stmts[0].kind else {
            panic!("expected assert with message");
        };
        assert_eq!(ops[0].0, CmpOp::Eq);
        assert_eq!(msg, "y should be 5");
    }

    #[test]
    fn test_not_in() {
        let stmts = parse_src("3 not in xs");
        let StmtKind::Expr(Expr::Compare(_, ops)) = &stmts[0].kind else {
            panic!("expected comparison");
        };
        assert_eq!(ops[0].0, CmpOp::NotIn);
    }

    #[test]
    fn test_raise_forms() {
        assert_eq!(parse_src("raise")[0].kind, StmtKind::Raise(None));
        assert_eq!(
            parse_src("raise ValueError('bad')")[0].kind,
            StmtKind::Raise(Some(("ValueError".into(), Some(Expr::Str("bad".into())))))
        );
    }

    #[test]
    fn test_index_assignment_and_aug_assign() {
        let stmts = parse_src("xs[0] = 1\ntotal += xs[0]");
        assert!(matches!(
            &stmts[0].kind,
            StmtKind::Assign(Target::Index(name, Expr::Int(0)), Expr::Int(1)) if name == "xs"
        ));
        assert!(matches!(
            &stmts[1].kind,
            StmtKind::AugAssign(Target::Name(name), BinOp::Add, _) if name == "total"
        ));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_err("1 = x");
        assert_eq!(err.name, "SyntaxError");
        assert_eq!(err.message, "cannot assign to expression");
    }

    #[test]
    fn test_trailing_garbage_is_error() {
        let err = parse_err("x = 1 2");
        assert_eq!(err.message, "invalid syntax");
    }

    #[test]
    fn test_deep_parentheses_are_syntax_error() {
        let source = format!("x = {}1{}", "(".repeat(100_000), ")".repeat(100_000));
        let err = parse_err(&source);
        assert_eq!(err.name, "SyntaxError");
        assert_eq!(err.message, "too many nested parentheses");
    }

    #[test]
    fn test_deep_unary_and_lists_are_syntax_errors() {
        assert_eq!(parse_err(&format!("x = {}1", "-".repeat(10_000))).name, "SyntaxError");
        assert_eq!(parse_err(&format!("x = {}1", "not ".repeat(10_000))).name, "SyntaxError");
        let nested = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
        assert_eq!(parse_err(&nested).name, "SyntaxError");
    }

    #[test]
    fn test_long_operator_chain_is_syntax_error() {
        let source = vec!["1"; 100_000].join(" + ");
        let err = parse_err(&source);
        assert_eq!(err.message, "expression too deeply nested");
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        let source = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse_src(&source).len(), 1);
        let chain = vec!["1"; 200].join(" + ");
        assert_eq!(parse_src(&chain).len(), 1);
    }
}
