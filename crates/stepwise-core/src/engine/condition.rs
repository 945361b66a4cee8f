//! Condition expressions used by success conditions, failure actions and
//! next-step routing.
//!
//! Authored conditions are plain strings. They are parsed into a
//! [`Condition`] tree and interpreted against a [`ConditionContext`]; nothing
//! is ever executed as code. The accepted grammar:
//!
//! ```text
//! expr  := or
//! or    := and ("||" and)*
//! and   := unary ("&&" unary)*
//! unary := "!" unary | "(" expr ")" | atom
//! atom  := "always" | "true" | "never" | "false"
//!        | field op literal
//!        | name                      (registered predicate, "custom:" optional)
//! op    := "==" | "!=" | ">" | ">=" | "<" | "<="
//!        | "contains" | "matches" | "starts_with"
//! ```
//!
//! # Examples
//!
//! ```rust
//! use stepwise_core::engine::{Condition, ConditionContext, PredicateRegistry};
//!
//! let ctx = ConditionContext::new()
//!     .with("action", "power_on")
//!     .with("attempts", 2);
//! let registry = PredicateRegistry::new();
//!
//! let cond = Condition::parse("action == power_on && attempts >= 2").unwrap();
//! assert!(cond.evaluate(&ctx, &registry).unwrap());
//! ```

use std::{borrow::Cow, collections::BTreeMap, fmt};

use log::warn;
use regex::Regex;

use super::predicates::PredicateRegistry;
use crate::error::{GuideError, Result};

/// A value a condition can inspect.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Text(String),
    Number(f64),
}

impl ContextValue {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            ContextValue::Text(s) => Cow::Borrowed(s),
            ContextValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Cow::Owned(format!("{}", *n as i64))
            }
            ContextValue::Number(n) => Cow::Owned(n.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ContextValue::Text(s) => s.trim().parse().ok(),
            ContextValue::Number(n) => Some(*n),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        ContextValue::Number(f64::from(value))
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Number(f64::from(value))
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Number(value)
    }
}

/// Named values visible to a condition. Missing fields read as "".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionContext {
    fields: BTreeMap<String, ContextValue>,
}

impl ConditionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, returning the context for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.fields.get(key)
    }

    /// Text form of a field, empty when absent.
    pub fn text(&self, key: &str) -> Cow<'_, str> {
        self.get(key)
            .map(ContextValue::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ContextValue::as_number)
    }
}

/// Comparison operators available to `field op literal` atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    Matches,
    StartsWith,
}

impl CompareOp {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "contains" => Some(CompareOp::Contains),
            "matches" => Some(CompareOp::Matches),
            "starts_with" => Some(CompareOp::StartsWith),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Contains => "contains",
            CompareOp::Matches => "matches",
            CompareOp::StartsWith => "starts_with",
        }
    }
}

/// Parsed condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Always,
    Never,
    Compare {
        field: String,
        op: CompareOp,
        operand: String,
    },
    /// Registered predicate looked up by name
    Predicate(String),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    /// Parses an authored condition string.
    pub fn parse(expression: &str) -> Result<Self> {
        let invalid = |reason: String| GuideError::InvalidCondition {
            expression: expression.to_string(),
            reason,
        };

        let tokens = tokenize(expression).map_err(invalid)?;
        if tokens.is_empty() {
            return Err(invalid("empty condition".to_string()));
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let condition = parser.parse_or().map_err(invalid)?;
        if let Some(token) = parser.peek() {
            return Err(invalid(format!("unexpected {token}")));
        }
        Ok(condition)
    }

    /// Evaluates the condition.
    ///
    /// Unregistered predicate names evaluate to `false`. An error is returned
    /// only for an operand that cannot be compiled as a regular expression.
    pub fn evaluate(&self, ctx: &ConditionContext, predicates: &PredicateRegistry) -> Result<bool> {
        match self {
            Condition::Always => Ok(true),
            Condition::Never => Ok(false),
            Condition::Compare { field, op, operand } => compare(ctx, field, *op, operand),
            Condition::Predicate(name) => match predicates.lookup(name) {
                Some(predicate) => Ok(predicate(ctx)),
                None => {
                    warn!("No predicate registered under '{name}', treating as no match");
                    Ok(false)
                }
            },
            Condition::Not(inner) => Ok(!inner.evaluate(ctx, predicates)?),
            Condition::All(items) => {
                for item in items {
                    if !item.evaluate(ctx, predicates)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any(items) => {
                for item in items {
                    if item.evaluate(ctx, predicates)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// Parses and evaluates `expression`, treating any error as "no match".
pub(crate) fn matches_lenient(
    expression: &str,
    ctx: &ConditionContext,
    predicates: &PredicateRegistry,
) -> bool {
    match Condition::parse(expression).and_then(|c| c.evaluate(ctx, predicates)) {
        Ok(matched) => matched,
        Err(e) => {
            warn!("{e}; treating as no match");
            false
        }
    }
}

fn compare(ctx: &ConditionContext, field: &str, op: CompareOp, operand: &str) -> Result<bool> {
    let left = ctx.text(field);
    let numeric = || Some((ctx.number(field)?, operand.trim().parse::<f64>().ok()?));

    Ok(match op {
        CompareOp::Eq => left == operand || numeric().is_some_and(|(l, r)| l == r),
        CompareOp::Ne => !(left == operand || numeric().is_some_and(|(l, r)| l == r)),
        CompareOp::Gt => numeric().is_some_and(|(l, r)| l > r),
        CompareOp::Ge => numeric().is_some_and(|(l, r)| l >= r),
        CompareOp::Lt => numeric().is_some_and(|(l, r)| l < r),
        CompareOp::Le => numeric().is_some_and(|(l, r)| l <= r),
        CompareOp::Contains => left.contains(operand),
        CompareOp::StartsWith => left.starts_with(operand),
        CompareOp::Matches => {
            let re = Regex::new(operand).map_err(|e| GuideError::InvalidCondition {
                expression: format!("{field} matches {operand}"),
                reason: e.to_string(),
            })?;
            re.is_match(&left)
        }
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Op(CompareOp),
    Word(String),
    Quoted(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Not => write!(f, "'!'"),
            Token::And => write!(f, "'&&'"),
            Token::Or => write!(f, "'||'"),
            Token::Op(op) => write!(f, "'{}'", op.as_str()),
            Token::Word(w) => write!(f, "'{w}'"),
            Token::Quoted(q) => write!(f, "{q:?}"),
        }
    }
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Op(CompareOp::Eq));
                i += 2;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Op(CompareOp::Ne));
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '>' | '<' => {
                let op = match (c, next == Some('=')) {
                    ('>', true) => CompareOp::Ge,
                    ('>', false) => CompareOp::Gt,
                    ('<', true) => CompareOp::Le,
                    _ => CompareOp::Lt,
                };
                tokens.push(Token::Op(op));
                i += if next == Some('=') { 2 } else { 1 };
            }
            '"' | '\'' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err("unterminated string literal".to_string()),
                        Some('\\') if chars.get(i + 1).is_some() => {
                            text.push(chars[i + 1]);
                            i += 2;
                        }
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            text.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Quoted(text));
            }
            '&' | '|' | '=' => return Err(format!("unexpected character '{c}'")),
            _ => {
                let start = i;
                while i < chars.len() && !is_delimiter(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
        }
    }
    Ok(tokens)
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '!' | '=' | '<' | '>' | '&' | '|' | '"' | '\'')
}

/// Deepest nesting of `!` and parentheses a condition may use.
pub const MAX_NESTING: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

type ParseResult = std::result::Result<Condition, String>;

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> ParseResult {
        let mut items = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.advance();
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Condition::Any(items)
        })
    }

    fn parse_and(&mut self) -> ParseResult {
        let mut items = vec![self.parse_unary()?];
        while self.peek() == Some(&Token::And) {
            self.advance();
            items.push(self.parse_unary()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Condition::All(items)
        })
    }

    /// Bounds recursion so evaluation depth is bounded too.
    fn nest<F>(&mut self, parse: F) -> ParseResult
    where
        F: FnOnce(&mut Self) -> ParseResult,
    {
        if self.depth >= MAX_NESTING {
            return Err(format!("nesting exceeds {MAX_NESTING} levels"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_unary(&mut self) -> ParseResult {
        match self.peek() {
            Some(Token::Not) => {
                self.advance();
                self.nest(|p| Ok(Condition::Not(Box::new(p.parse_unary()?))))
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.nest(Self::parse_or)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(format!("expected ')' but found {token}")),
                    None => Err("missing ')'".to_string()),
                }
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> ParseResult {
        let word = match self.advance() {
            Some(Token::Word(word)) => word,
            Some(token) => return Err(format!("unexpected {token}")),
            None => return Err("unexpected end of condition".to_string()),
        };

        let op = match self.peek() {
            Some(Token::Op(op)) => Some(*op),
            Some(Token::Word(w)) => CompareOp::from_word(w),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = match self.advance() {
                Some(Token::Word(w)) | Some(Token::Quoted(w)) => w,
                Some(token) => return Err(format!("expected a value after '{}', found {token}", op.as_str())),
                None => return Err(format!("expected a value after '{}'", op.as_str())),
            };
            return Ok(Condition::Compare {
                field: word,
                op,
                operand,
            });
        }

        Ok(match word.as_str() {
            "always" | "true" => Condition::Always,
            "never" | "false" => Condition::Never,
            _ => match word.strip_prefix("custom:") {
                Some("") => return Err("predicate name missing after 'custom:'".to_string()),
                Some(name) => Condition::Predicate(name.to_string()),
                None => Condition::Predicate(word),
            },
        })
    }
}
