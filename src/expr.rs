//! Boolean tag expressions.
//!
//! A filter can carry any number of expressions over a photo's tag set:
//!
//! ```text
//! noah & !beach
//! (baby | toddler) & !blurry
//! birthday party | christmas
//! ```
//!
//! ## Grammar
//!
//! ```text
//! expr    := and ( '|' and )*
//! and     := unary ( '&' unary )*
//! unary   := '!' unary | primary
//! primary := TAG | '(' expr ')'
//! ```
//!
//! `!` binds tighter than `&`, which binds tighter than `|`. A `TAG` is a run
//! of letters, digits and spaces with surrounding spaces trimmed, so
//! `birthday party` is a single operand. Any other character (tabs and
//! newlines too) is rejected when the expression is compiled, never when it
//! is evaluated.
//!
//! An operand is true iff the photo's tag set contains it exactly. Tags are
//! stored lowercase, so `Noah` never matches.
//!
//! Expressions compile to a small [`Expr`] tree that is interpreted against
//! a tag set. [`BoolExpr`] pairs the tree with its source text, which is the
//! form stored in filters and written to the cache document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("illegal character '{character}' at position {position}")]
    IllegalCharacter { character: char, position: usize },
    #[error("expression is empty")]
    Empty,
    #[error("unexpected '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unclosed '(' at position {0}")]
    UnclosedParen(usize),
}

/// Compiled expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn eval(&self, tags: &BTreeSet<String>) -> bool {
        match self {
            Expr::Tag(tag) => tags.contains(tag),
            Expr::Not(inner) => !inner.eval(tags),
            Expr::And(lhs, rhs) => lhs.eval(tags) && rhs.eval(tags),
            Expr::Or(lhs, rhs) => lhs.eval(tags) || rhs.eval(tags),
        }
    }
}

/// A validated expression together with the text it was compiled from.
///
/// Serializes as its source string; deserializing compiles it again, so an
/// invalid expression in a document is a parse error rather than a stored
/// unvalidated value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoolExpr {
    source: String,
    tree: Expr,
}

impl BoolExpr {
    pub fn compile(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        let tree = Parser::new(tokens).parse()?;
        Ok(Self {
            source: source.to_string(),
            tree,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    pub fn eval(&self, tags: &BTreeSet<String>) -> bool {
        self.tree.eval(tags)
    }
}

impl PartialEq for BoolExpr {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for BoolExpr {}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for BoolExpr {
    type Error = ExprError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::compile(&source)
    }
}

impl From<BoolExpr> for String {
    fn from(expr: BoolExpr) -> Self {
        expr.source
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Tag(String),
    And,
    Or,
    Not,
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Tag(tag) => f.write_str(tag),
            Token::And => f.write_str("&"),
            Token::Or => f.write_str("|"),
            Token::Not => f.write_str("!"),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

/// Token plus its character position in the source.
#[derive(Debug)]
struct Spanned {
    token: Token,
    position: usize,
}

fn tokenize(source: &str) -> Result<Vec<Spanned>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            '&' => Token::And,
            '|' => Token::Or,
            '!' => Token::Not,
            '(' => Token::Open,
            ')' => Token::Close,
            ' ' => {
                i += 1;
                continue;
            }
            c if c.is_alphanumeric() => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == ' ') {
                    i += 1;
                }
                let tag: String = chars[start..i].iter().collect();
                tokens.push(Spanned {
                    token: Token::Tag(tag.trim_end_matches(' ').to_string()),
                    position: start,
                });
                continue;
            }
            other => {
                return Err(ExprError::IllegalCharacter {
                    character: other,
                    position: i,
                });
            }
        };
        tokens.push(Spanned { token, position: i });
        i += 1;
    }

    Ok(tokens)
}

// ============================================================================
// Recursive-descent parser
// ============================================================================

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Expr, ExprError> {
        if self.tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        let expr = self.parse_or()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some(extra) => Err(unexpected(extra)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let Some(spanned) = self.tokens.get(self.pos) else {
            return Err(ExprError::UnexpectedEnd);
        };
        match &spanned.token {
            Token::Tag(tag) => {
                let expr = Expr::Tag(tag.clone());
                self.pos += 1;
                Ok(expr)
            }
            Token::Open => {
                let open_at = spanned.position;
                self.pos += 1;
                let inner = self.parse_or()?;
                match self.tokens.get(self.pos) {
                    Some(Spanned {
                        token: Token::Close,
                        ..
                    }) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some(other) => Err(unexpected(other)),
                    None => Err(ExprError::UnclosedParen(open_at)),
                }
            }
            _ => Err(unexpected(spanned)),
        }
    }
}

fn unexpected(spanned: &Spanned) -> ExprError {
    ExprError::UnexpectedToken {
        token: spanned.token.to_string(),
        position: spanned.position,
    }
}
