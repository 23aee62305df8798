//! Dynamic-size expression evaluator (§4.7).
//!
//! Segment sizes can be given as a small arithmetic expression over
//! previously bound variable names, e.g. `"n*8"` or `"(header_len - 4) / 2"`.
//! Grammar:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := INTEGER | NAME | '(' expr ')'
//! ```

use bitsyntax_core::error::{CodecError, CodecResult, ErrorKind};
use bitsyntax_core::VariableTable;

/// Parse and evaluate `source` against `table`, returning the resolved
/// size. Parsing is cheap enough (a handful of tokens) that no AST is
/// cached between calls; each dynamic segment reparses its expression.
pub fn evaluate(source: &str, table: &VariableTable) -> CodecResult<i64> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let value = parser.parse_expr(table)?;
    if parser.pos != parser.tokens.len() {
        return Err(CodecError::new(
            ErrorKind::InvalidSize,
            format!("unexpected trailing input in expression {:?}", source),
        ));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> CodecResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            d if d.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<i64>().map_err(|_| {
                    CodecError::new(ErrorKind::InvalidSize, format!("bad integer literal {:?}", text))
                })?;
                tokens.push(Token::Int(value));
            }
            n if n.is_alphabetic() || n == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Name(text));
            }
            other => {
                return Err(CodecError::new(
                    ErrorKind::InvalidSize,
                    format!("unexpected character {:?} in expression", other),
                ))
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn parse_expr(&mut self, table: &VariableTable) -> CodecResult<i64> {
        let mut value = self.parse_term(table)?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.parse_term(table)?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.parse_term(table)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self, table: &VariableTable) -> CodecResult<i64> {
        let mut value = self.parse_factor(table)?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.parse_factor(table)?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let divisor = self.parse_factor(table)?;
                    if divisor == 0 {
                        return Err(CodecError::new(ErrorKind::DivisionByZero, "division by zero in size expression"));
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self, table: &VariableTable) -> CodecResult<i64> {
        match self.advance().cloned() {
            Some(Token::Int(v)) => Ok(v),
            Some(Token::Name(name)) => table.get(&name).ok_or_else(|| {
                CodecError::new(ErrorKind::UnboundVariable, name)
            }),
            Some(Token::Minus) => Ok(-self.parse_factor(table)?),
            Some(Token::LParen) => {
                let value = self.parse_expr(table)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(CodecError::new(ErrorKind::InvalidSize, "expected ')'")),
                }
            }
            other => Err(CodecError::new(
                ErrorKind::InvalidSize,
                format!("unexpected token {:?} in size expression", other),
            )),
        }
    }
}
