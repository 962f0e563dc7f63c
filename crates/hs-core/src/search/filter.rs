//! Filter expressions.
//!
//! ```text
//! expr    := and ("OR" and)*
//! and     := unary ("AND" unary)*
//! unary   := "NOT" unary | primary
//! primary := "(" expr ")" | attr ":" value | attr op number
//! op      := "<" | "<=" | "=" | "!=" | ">=" | ">"
//! ```
//!
//! Attributes and values may be double-quoted. Dotted attributes address
//! nested objects. Keywords are upper case.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl NumericOp {
    fn apply(self, left: f64, right: f64) -> bool {
        match self {
            NumericOp::Lt => left < right,
            NumericOp::Le => left <= right,
            NumericOp::Eq => left == right,
            NumericOp::Ne => left != right,
            NumericOp::Ge => left >= right,
            NumericOp::Gt => left > right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Or(Vec<FilterExpr>),
    And(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
    Facet {
        attribute: String,
        value: String,
    },
    Numeric {
        attribute: String,
        op: NumericOp,
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid filter at position {position}: {message}")]
pub struct FilterSyntaxError {
    pub position: usize,
    pub message: String,
}

impl FilterSyntaxError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

impl FilterExpr {
    pub fn parse(input: &str) -> Result<Self, FilterSyntaxError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            end: input.chars().count(),
            depth: 0,
        };
        let expr = parser.expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(FilterSyntaxError::new(
                token.offset,
                format!("unexpected {}", token.kind),
            )),
        }
    }

    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        match self {
            FilterExpr::Or(terms) => terms.iter().any(|t| t.matches(record)),
            FilterExpr::And(terms) => terms.iter().all(|t| t.matches(record)),
            FilterExpr::Not(inner) => !inner.matches(record),
            FilterExpr::Facet { attribute, value } => lookup(record, attribute)
                .is_some_and(|found| any_scalar(found, &|v| facet_eq(v, value))),
            FilterExpr::Numeric {
                attribute,
                op,
                value,
            } => lookup(record, attribute).is_some_and(|found| {
                any_scalar(found, &|v| as_f64(v).is_some_and(|n| op.apply(n, *value)))
            }),
        }
    }
}

impl FromStr for FilterExpr {
    type Err = FilterSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterExpr::parse(s)
    }
}

fn lookup<'a>(record: &'a Map<String, Value>, attribute: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(attribute) {
        return Some(value);
    }
    let mut parts = attribute.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn any_scalar(value: &Value, predicate: &dyn Fn(&Value) -> bool) -> bool {
    match value {
        Value::Array(items) => items.iter().any(predicate),
        other => predicate(other),
    }
}

fn facet_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Bool(b) => expected.eq_ignore_ascii_case(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            n.to_string() == expected
                || expected.parse::<f64>().ok() == n.as_f64()
        }
        _ => false,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    LParen,
    RParen,
    Colon,
    Op(NumericOp),
    Word(String),
    Quoted(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Op(_) => f.write_str("comparison operator"),
            TokenKind::Word(w) => write!(f, "'{w}'"),
            TokenKind::Quoted(q) => write!(f, "\"{q}\""),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

impl Token {
    fn keyword(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(w) if matches!(w.as_str(), "AND" | "OR" | "NOT") => Some(w),
            _ => None,
        }
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | ':' | '<' | '>' | '=' | '!' | '"')
}

fn tokenize(input: &str) -> Result<Vec<Token>, FilterSyntaxError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let kind = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => {
                i += 1;
                TokenKind::LParen
            }
            ')' => {
                i += 1;
                TokenKind::RParen
            }
            ':' => {
                i += 1;
                TokenKind::Colon
            }
            '<' | '>' | '=' | '!' => {
                let followed_by_eq = chars.get(i + 1) == Some(&'=');
                let (op, width) = match (c, followed_by_eq) {
                    ('<', true) => (NumericOp::Le, 2),
                    ('<', false) => (NumericOp::Lt, 1),
                    ('>', true) => (NumericOp::Ge, 2),
                    ('>', false) => (NumericOp::Gt, 1),
                    ('!', true) => (NumericOp::Ne, 2),
                    ('=', _) => (NumericOp::Eq, 1),
                    _ => return Err(FilterSyntaxError::new(start, "expected '!='")),
                };
                i += width;
                TokenKind::Op(op)
            }
            '"' => {
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(FilterSyntaxError::new(start, "unterminated string"))
                        }
                        Some('\\') if i + 1 < chars.len() => {
                            text.push(chars[i + 1]);
                            i += 2;
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            text.push(*ch);
                            i += 1;
                        }
                    }
                }
                TokenKind::Quoted(text)
            }
            _ => {
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                TokenKind::Word(chars[start..i].iter().collect())
            }
        };
        tokens.push(Token {
            kind,
            offset: start,
        });
    }
    Ok(tokens)
}

/// Deepest accepted nesting of parentheses and `NOT`.
const MAX_NESTING: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().and_then(Token::keyword) == Some(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn nest(&mut self, offset: usize) -> Result<(), FilterSyntaxError> {
        if self.depth == MAX_NESTING {
            return Err(FilterSyntaxError::new(offset, "filter is nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    fn expr(&mut self) -> Result<FilterExpr, FilterSyntaxError> {
        let mut terms = vec![self.and()?];
        while self.eat_keyword("OR") {
            terms.push(self.and()?);
        }
        Ok(collapse(terms, FilterExpr::Or))
    }

    fn and(&mut self) -> Result<FilterExpr, FilterSyntaxError> {
        let mut terms = vec![self.unary()?];
        while self.eat_keyword("AND") {
            terms.push(self.unary()?);
        }
        Ok(collapse(terms, FilterExpr::And))
    }

    fn unary(&mut self) -> Result<FilterExpr, FilterSyntaxError> {
        let offset = self.peek().map_or(self.end, |token| token.offset);
        if self.eat_keyword("NOT") {
            self.nest(offset)?;
            let inner = self.unary();
            self.depth -= 1;
            return Ok(FilterExpr::Not(Box::new(inner?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<FilterExpr, FilterSyntaxError> {
        let token = self
            .bump()
            .ok_or_else(|| FilterSyntaxError::new(self.end, "unexpected end of filter"))?;

        let attribute = match token.kind {
            TokenKind::LParen => {
                self.nest(token.offset)?;
                let inner = self.expr();
                self.depth -= 1;
                let inner = inner?;
                return match self.bump() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(FilterSyntaxError::new(
                        other.offset,
                        format!("expected ')', found {}", other.kind),
                    )),
                    None => Err(FilterSyntaxError::new(self.end, "missing ')'")),
                };
            }
            TokenKind::Word(ref w) if token.keyword().is_none() => w.clone(),
            TokenKind::Quoted(q) => q,
            other => {
                return Err(FilterSyntaxError::new(
                    token.offset,
                    format!("expected attribute, found {other}"),
                ))
            }
        };

        match self.bump() {
            Some(Token {
                kind: TokenKind::Colon,
                ..
            }) => {
                let value = self.value()?;
                Ok(FilterExpr::Facet { attribute, value })
            }
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) => {
                let value = self.number()?;
                Ok(FilterExpr::Numeric {
                    attribute,
                    op,
                    value,
                })
            }
            Some(other) => Err(FilterSyntaxError::new(
                other.offset,
                format!("expected ':' or comparison after '{attribute}', found {}", other.kind),
            )),
            None => Err(FilterSyntaxError::new(
                self.end,
                format!("expected ':' or comparison after '{attribute}'"),
            )),
        }
    }

    fn value(&mut self) -> Result<String, FilterSyntaxError> {
        match self.bump() {
            Some(Token {
                kind: TokenKind::Word(w),
                ..
            }) => Ok(w),
            Some(Token {
                kind: TokenKind::Quoted(q),
                ..
            }) => Ok(q),
            Some(other) => Err(FilterSyntaxError::new(
                other.offset,
                format!("expected value, found {}", other.kind),
            )),
            None => Err(FilterSyntaxError::new(self.end, "expected value")),
        }
    }

    fn number(&mut self) -> Result<f64, FilterSyntaxError> {
        match self.bump() {
            Some(Token {
                kind: TokenKind::Word(w),
                offset,
            }) => w
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| FilterSyntaxError::new(offset, format!("'{w}' is not a number"))),
            Some(other) => Err(FilterSyntaxError::new(
                other.offset,
                format!("expected number, found {}", other.kind),
            )),
            None => Err(FilterSyntaxError::new(self.end, "expected number")),
        }
    }
}

fn collapse(mut terms: Vec<FilterExpr>, group: fn(Vec<FilterExpr>) -> FilterExpr) -> FilterExpr {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        group(terms)
    }
}
