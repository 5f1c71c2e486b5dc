// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Expression syntax.
//!
//! ```text
//! expr := term (('+' | '-') term)*
//! term := '-' term | atom
//! atom := INT | '2' '^' atom | '(' expr ')'
//! ```
//!
//! Unary minus, `^` and parentheses may nest at most [`MAX_DEPTH`] levels.
//! A minus directly in front of `9223372036854775808` reads as `i64::MIN`.

use thiserror::Error;

/// Deepest nesting of unary minus, `^` and parentheses that `parse` accepts.
pub const MAX_DEPTH: usize = 256;

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Integer literal.
    Int(i64),
    /// Unary minus.
    Neg(Box<Expr>),
    /// `a ± b ± ...`, folded left to right.
    Sum(Box<Expr>, Vec<(AddOp, Expr)>),
    /// `2^e`
    Pow2(Box<Expr>),
}

/// Operator in front of a summand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOp {
    /// `+`
    Plus,
    /// `-`
    Minus,
}

/// Syntax errors with byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A character outside the grammar.
    #[error("unexpected {found:?} at offset {offset}")]
    Unexpected {
        /// Offending character.
        found: char,
        /// Byte offset.
        offset: usize,
    },
    /// Input ended inside an expression.
    #[error("unexpected end of input")]
    UnexpectedEnd,
    /// Literal does not fit in `i64`.
    #[error("integer at offset {offset} does not fit in 64 bits")]
    IntegerOverflow {
        /// Byte offset of the literal.
        offset: usize,
    },
    /// `^` with a base other than 2.
    #[error("only base 2 is supported before '^' (offset {offset})")]
    UnsupportedBase {
        /// Byte offset of the base.
        offset: usize,
    },
    /// Nesting deeper than [`MAX_DEPTH`].
    #[error("expression nests deeper than {} levels at offset {offset}", MAX_DEPTH)]
    TooDeep {
        /// Byte offset where the limit was hit.
        offset: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// Unsigned magnitude; range is checked once the sign is known.
    Int(u64),
    Plus,
    Minus,
    Caret,
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '^' => Token::Caret,
            '(' => Token::Open,
            ')' => Token::Close,
            '0'..='9' => {
                let mut value = u64::from(c as u8 - b'0');
                while let Some(&(_, d @ '0'..='9')) = chars.peek() {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u64::from(d as u8 - b'0')))
                        .ok_or(ParseError::IntegerOverflow { offset })?;
                    chars.next();
                }
                Token::Int(value)
            }
            found => return Err(ParseError::Unexpected { found, offset }),
        };
        tokens.push((offset, token));
    }
    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<Token> {
        self.tokens.get(self.pos + ahead).map(|&(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.input.len(), |&(o, _)| o)
    }

    fn unexpected(&self) -> ParseError {
        let offset = self.offset();
        self.input[offset..]
            .chars()
            .next()
            .map_or(ParseError::UnexpectedEnd, |found| ParseError::Unexpected { found, offset })
    }

    /// Runs `rule` one nesting level deeper.
    fn nested(
        &mut self,
        rule: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        if self.depth == MAX_DEPTH {
            return Err(ParseError::TooDeep {
                offset: self.offset(),
            });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let first = self.term()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => AddOp::Plus,
                Some(Token::Minus) => AddOp::Minus,
                _ => break,
            };
            self.pos += 1;
            rest.push((op, self.term()?));
        }
        if rest.is_empty() {
            return Ok(first);
        }
        Ok(Expr::Sum(Box::new(first), rest))
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        if self.peek() != Some(Token::Minus) {
            return self.atom();
        }
        self.pos += 1;
        if self.peek() == Some(Token::Int(i64::MIN.unsigned_abs()))
            && self.peek_at(1) != Some(Token::Caret)
        {
            self.pos += 1;
            return Ok(Expr::Int(i64::MIN));
        }
        Ok(Expr::Neg(Box::new(self.nested(Self::term)?)))
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset();
        match self.peek() {
            Some(Token::Int(value)) => {
                self.pos += 1;
                if self.peek() != Some(Token::Caret) {
                    let value =
                        i64::try_from(value).map_err(|_| ParseError::IntegerOverflow { offset })?;
                    return Ok(Expr::Int(value));
                }
                if value != 2 {
                    return Err(ParseError::UnsupportedBase { offset });
                }
                self.pos += 1;
                Ok(Expr::Pow2(Box::new(self.nested(Self::atom)?)))
            }
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.nested(Self::expr)?;
                if self.peek() != Some(Token::Close) {
                    return Err(self.unexpected());
                }
                self.pos += 1;
                Ok(inner)
            }
            _ => Err(self.unexpected()),
        }
    }
}

/// Parses a complete expression.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser {
        input,
        tokens: tokenize(input)?,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}
