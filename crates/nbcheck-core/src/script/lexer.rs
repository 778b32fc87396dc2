//! Tokenizer for the script language.

use crate::kernel::CellError;

/// A token kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),

    // Keywords
    True,
    False,
    None,
    And,
    Or,
    Not,
    In,
    Assert,
    Raise,
    Del,
    Pass,

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    /// End of a logical line (newline or `;`).
    Newline,
    Eof,
}

/// A token with the 1-based source line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
}

pub(crate) fn syntax_error(line: usize, message: impl Into<String>) -> CellError {
    CellError::new("SyntaxError", message).with_location(format!("line {}", line))
}

/// Split cell source into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CellError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    depth: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            depth: 0,
            tokens: Vec::new(),
        }
    }

    fn push(&mut self, tok: Tok) {
        self.tokens.push(Token {
            tok,
            line: self.line,
        });
    }

    /// Emit a line break unless the previous token already ended a line.
    fn push_newline(&mut self) {
        let redundant = matches!(
            self.tokens.last(),
            None | Some(Token {
                tok: Tok::Newline,
                ..
            })
        );
        if !redundant {
            self.push(Tok::Newline);
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn run(mut self) -> Result<Vec<Token>, CellError> {
        while let Some(c) = self.chars.next() {
            match c {
                '\n' => {
                    if self.depth == 0 {
                        self.push_newline();
                    }
                    self.line += 1;
                }
                ' ' | '\t' | '\r' => {}
                '#' => {
                    while let Some(&next) = self.chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                '\\' => {
                    if !self.eat('\n') {
                        return Err(syntax_error(
                            self.line,
                            "unexpected character after line continuation character",
                        ));
                    }
                    self.line += 1;
                }
                ';' => self.push_newline(),
                '(' => {
                    self.depth += 1;
                    self.push(Tok::LParen);
                }
                ')' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.push(Tok::RParen);
                }
                '[' => {
                    self.depth += 1;
                    self.push(Tok::LBracket);
                }
                ']' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.push(Tok::RBracket);
                }
                ',' => self.push(Tok::Comma),
                '+' => {
                    let tok = if self.eat('=') { Tok::PlusAssign } else { Tok::Plus };
                    self.push(tok);
                }
                '-' => {
                    let tok = if self.eat('=') { Tok::MinusAssign } else { Tok::Minus };
                    self.push(tok);
                }
                '*' => {
                    let tok = if self.eat('*') {
                        Tok::DoubleStar
                    } else if self.eat('=') {
                        Tok::StarAssign
                    } else {
                        Tok::Star
                    };
                    self.push(tok);
                }
                '/' => {
                    let tok = if self.eat('/') {
                        Tok::DoubleSlash
                    } else if self.eat('=') {
                        Tok::SlashAssign
                    } else {
                        Tok::Slash
                    };
                    self.push(tok);
                }
                '%' => self.push(Tok::Percent),
                '=' => {
                    let tok = if self.eat('=') { Tok::Eq } else { Tok::Assign };
                    self.push(tok);
                }
                '!' => {
                    if !self.eat('=') {
                        return Err(syntax_error(self.line, "invalid syntax"));
                    }
                    self.push(Tok::NotEq);
                }
                '<' => {
                    let tok = if self.eat('=') { Tok::LtEq } else { Tok::Lt };
                    self.push(tok);
                }
                '>' => {
                    let tok = if self.eat('=') { Tok::GtEq } else { Tok::Gt };
                    self.push(tok);
                }
                '"' | '\'' => {
                    let text = self.string(c)?;
                    self.push(Tok::Str(text));
                }
                c if c.is_ascii_digit() => {
                    let tok = self.number(c)?;
                    self.push(tok);
                }
                c if c == '_' || c.is_alphabetic() => {
                    let word = self.word(c);
                    self.push(keyword(&word).unwrap_or(Tok::Name(word)));
                }
                other => {
                    return Err(syntax_error(
                        self.line,
                        format!("invalid character '{}'", other),
                    ));
                }
            }
        }

        if self.depth > 0 {
            return Err(syntax_error(self.line, "unexpected EOF while parsing"));
        }
        self.push_newline();
        self.push(Tok::Eof);
        Ok(self.tokens)
    }

    fn string(&mut self, quote: char) -> Result<String, CellError> {
        let start = self.line;
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None | Some('\n') => {
                    return Err(syntax_error(start, "unterminated string literal"));
                }
                Some(c) if c == quote => return Ok(text),
                Some('\\') => match self.chars.next() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('0') => text.push('\0'),
                    Some('\\') => text.push('\\'),
                    Some('\'') => text.push('\''),
                    Some('"') => text.push('"'),
                    Some('\n') => self.line += 1,
                    Some(other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => return Err(syntax_error(start, "unterminated string literal")),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn number(&mut self, first: char) -> Result<Tok, CellError> {
        let mut text = String::from(first);
        let mut is_float = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '_' {
                // digit separator
            } else if c == '.' && !is_float {
                is_float = true;
                text.push(c);
            } else if c == 'e' || c == 'E' {
                is_float = true;
                text.push(c);
                self.chars.next();
                if let Some(&sign) = self.chars.peek() {
                    if sign == '+' || sign == '-' {
                        text.push(sign);
                        self.chars.next();
                    }
                }
                continue;
            } else {
                break;
            }
            self.chars.next();
        }

        if is_float {
            text.parse::<f64>()
                .map(Tok::Float)
                .map_err(|_| syntax_error(self.line, format!("invalid decimal literal '{}'", text)))
        } else {
            text.parse::<i64>()
                .map(Tok::Int)
                .map_err(|_| syntax_error(self.line, format!("integer literal too large: {}", text)))
        }
    }

    fn word(&mut self, first: char) -> String {
        let mut word = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c == '_' || c.is_alphanumeric() {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        word
    }
}

fn keyword(word: &str) -> Option<Tok> {
    let tok = match word {
        "True" => Tok::True,
        "False" => Tok::False,
        "None" => Tok::None,
        "and" => Tok::And,
        "or" => Tok::Or,
        "not" => Tok::Not,
        "in" => Tok::In,
        "assert" => Tok::Assert,
        "raise" => Tok::Raise,
        "del" => Tok::Del,
        "pass" => Tok::Pass,
        _ => return None,
    };
    Some(tok)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Tok> {
        tokenize(source).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            kinds("x = 2"),
            vec![
                Tok::Name("x".into()),
                Tok::Assign,
                Tok::Int(2),
                Tok::Newline,
                Tok::Eof
            ]
        );
    }

    #[test]
    fn test_operators_and_keywords() {
        assert_eq!(
            kinds("assert y == 5 ** 2 // 1"),
            vec![
                Tok::Assert,
                Tok::Name("y".into()),
                Tok::Eq,
                Tok::Int(5),
                Tok::DoubleStar,
                Tok::Int(2),
                Tok::DoubleSlash,
                Tok::Int(1),
                Tok::Newline,
                Tok::Eof
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines_collapse() {
        assert_eq!(
            kinds("# setup\n\nx = 1  # one\n\n"),
            vec![
                Tok::Name("x".into()),
                Tok::Assign,
                Tok::Int(1),
                Tok::Newline,
                Tok::Eof
            ]
        );
    }

    #[test]
    fn test_newlines_inside_brackets_are_ignored() {
        let toks = kinds("xs = [1,\n 2]\n");
        assert_eq!(toks.iter().filter(|t| **t == Tok::Newline).count(), 1);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("a = 1\nb = 2").unwrap();
        let b = tokens
            .iter()
            .find(|t| t.tok == Tok::Name("b".into()))
            .unwrap();
        assert_eq!(b.line, 2);
    }

    #[test]
    fn test_strings_and_floats() {
        assert_eq!(
            kinds(r#"s = 'it\'s' + "x\n"; f = 1.5e3"#),
            vec![
                Tok::Name("s".into()),
                Tok::Assign,
                Tok::Str("it's".into()),
                Tok::Plus,
                Tok::Str("x\n".into()),
                Tok::Newline,
                Tok::Name("f".into()),
                Tok::Assign,
                Tok::Float(1500.0),
                Tok::Newline,
                Tok::Eof
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_syntax_error() {
        let err = tokenize("s = 'abc").unwrap_err();
        assert_eq!(err.name, "SyntaxError");
        assert_eq!(err.message, "unterminated string literal");
    }

    #[test]
    fn test_unclosed_bracket_is_syntax_error() {
        let err = tokenize("xs = [1, 2").unwrap_err();
        assert_eq!(err.name, "SyntaxError");
    }
}
