//! RSQL filter expressions.
//!
//! The supported subset:
//!
//! ```text
//! or         := and ( ',' and )*
//! and        := term ( ';' term )*
//! term       := '(' or ')' | comparison
//! comparison := field operator arguments
//! operator   := '==' | '!=' | '=gt=' | '=ge=' | '=lt=' | '=le=' | '=in=' | '=out='
//! arguments  := value | '(' value ( ',' value )* ')'
//! ```
//!
//! `;` (AND) binds tighter than `,` (OR). Values may be single- or
//! double-quoted. With `==`, a leading or trailing `*` on a string value is a
//! wildcard.
//!
//! Expressions are limited to [`MAX_FILTER_LENGTH`] characters and
//! [`MAX_FILTER_DEPTH`] levels of parentheses.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::sort::{compare_ids, compare_values};
use crate::types::Resource;

/// Longest accepted expression, in characters.
pub const MAX_FILTER_LENGTH: usize = 4096;

/// Deepest accepted parenthesis nesting.
pub const MAX_FILTER_DEPTH: usize = 32;

/// Error parsing a filter expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// The expression is empty.
    #[error("empty filter expression")]
    Empty,
    /// The expression ended early.
    #[error("unexpected end of filter expression")]
    UnexpectedEnd,
    /// A character that cannot appear at this position.
    #[error("unexpected '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    /// An operator outside the supported set.
    #[error("unsupported operator '{0}'")]
    UnknownOperator(String),
    /// A quoted value without its closing quote.
    #[error("unterminated quoted value starting at position {0}")]
    UnterminatedQuote(usize),
    /// A single-valued operator was given a list.
    #[error("operator '{0}' takes a single value")]
    ExpectedSingleValue(Operator),
    /// The expression exceeds [`MAX_FILTER_LENGTH`] characters.
    #[error("filter expression is {0} characters long (limit {limit})", limit = MAX_FILTER_LENGTH)]
    TooLong(usize),
    /// Parentheses nest deeper than [`MAX_FILTER_DEPTH`].
    #[error("filter expression nests deeper than {limit} levels", limit = MAX_FILTER_DEPTH)]
    TooDeep,
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `=gt=`
    Gt,
    /// `=ge=`
    Ge,
    /// `=lt=`
    Lt,
    /// `=le=`
    Le,
    /// `=in=`
    In,
    /// `=out=`
    Out,
}

impl Operator {
    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "=gt=" => Operator::Gt,
            "=ge=" => Operator::Ge,
            "=lt=" => Operator::Lt,
            "=le=" => Operator::Le,
            "=in=" => Operator::In,
            "=out=" => Operator::Out,
            _ => return None,
        })
    }

    fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::Out)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => "=gt=",
            Operator::Ge => "=ge=",
            Operator::Lt => "=lt=",
            Operator::Le => "=le=",
            Operator::In => "=in=",
            Operator::Out => "=out=",
        };
        f.write_str(token)
    }
}

/// One `field operator arguments` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    field: String,
    operator: Operator,
    arguments: Vec<String>,
}

impl Comparison {
    /// Returns the compared field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the literal arguments.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    fn matches(&self, resource: &Resource) -> bool {
        let compare = |literal: &str| -> Option<Ordering> {
            if self.field == "id" {
                Some(compare_ids(resource.id(), literal))
            } else {
                compare_literal(resource.attribute(&self.field).unwrap_or(&Value::Null), literal)
            }
        };
        let equals = |literal: &str| -> bool {
            if self.field != "id"
                && let Some(Value::String(actual)) = resource.attribute(&self.field)
                && literal.contains('*')
            {
                return wildcard_match(actual, literal);
            }
            compare(literal) == Some(Ordering::Equal)
        };

        match self.operator {
            Operator::Eq => equals(self.arguments[0].as_str()),
            Operator::Ne => !equals(self.arguments[0].as_str()),
            Operator::Gt => compare(self.arguments[0].as_str()) == Some(Ordering::Greater),
            Operator::Ge => matches!(compare(self.arguments[0].as_str()), Some(Ordering::Greater | Ordering::Equal)),
            Operator::Lt => compare(self.arguments[0].as_str()) == Some(Ordering::Less),
            Operator::Le => matches!(compare(self.arguments[0].as_str()), Some(Ordering::Less | Ordering::Equal)),
            Operator::In => self.arguments.iter().any(|a| equals(a.as_str())),
            Operator::Out => !self.arguments.iter().any(|a| equals(a.as_str())),
        }
    }
}

/// A parsed filter expression.
///
/// ```rust
/// use jsonapi_graph::query::Filter;
/// use jsonapi_graph::types::{Resource, ResourceIdentifier};
///
/// let filter = Filter::parse("horsepower=ge=100;vin==ABC*,id=in=(7,8)").unwrap();
/// let tractor = Resource::new(ResourceIdentifier::new("tractor", "1"))
///     .with_attribute("horsepower", 102)
///     .with_attribute("vin", "ABC123");
///
/// assert!(filter.matches(&tractor));
/// assert_eq!(filter.fields(), vec!["horsepower", "vin", "id"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every child must match.
    And(Vec<Filter>),
    /// At least one child must match.
    Or(Vec<Filter>),
    /// A single comparison.
    Compare(Comparison),
}

impl Filter {
    /// Parses an RSQL expression.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        if input.trim().is_empty() {
            return Err(FilterError::Empty);
        }
        let chars: Vec<char> = input.chars().collect();
        if chars.len() > MAX_FILTER_LENGTH {
            return Err(FilterError::TooLong(chars.len()));
        }
        let mut parser = Parser { chars, pos: 0, depth: 0 };
        let filter = parser.or()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(filter),
            Some(c) => Err(FilterError::UnexpectedChar(c, parser.pos)),
        }
    }

    /// Returns `true` if `resource` satisfies the expression.
    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|c| c.matches(resource)),
            Filter::Or(children) => children.iter().any(|c| c.matches(resource)),
            Filter::Compare(comparison) => comparison.matches(resource),
        }
    }

    /// Returns every compared field, in expression order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::And(children) | Filter::Or(children) => {
                children.iter().for_each(|c| c.collect_fields(out))
            },
            Filter::Compare(comparison) => {
                if !out.contains(&comparison.field.as_str()) {
                    out.push(&comparison.field);
                }
            },
        }
    }
}

/// Compares an attribute value to a literal, coercing the literal to the
/// value's JSON type. `None` means the two are not comparable.
fn compare_literal(value: &Value, literal: &str) -> Option<Ordering> {
    let coerced = match value {
        Value::Null => {
            return (literal == "null").then_some(Ordering::Equal);
        },
        Value::Bool(_) => Value::Bool(literal.parse().ok()?),
        Value::Number(_) => {
            if let Ok(integer) = literal.parse::<i64>() {
                Value::from(integer)
            } else if let Ok(integer) = literal.parse::<u64>() {
                Value::from(integer)
            } else {
                Value::from(literal.parse::<f64>().ok()?)
            }
        },
        Value::String(_) => Value::String(literal.to_string()),
        Value::Array(_) | Value::Object(_) => return None,
    };
    Some(compare_values(value, &coerced))
}

fn wildcard_match(actual: &str, pattern: &str) -> bool {
    let leading = pattern.starts_with('*');
    let trailing = pattern.len() > 1 && pattern.ends_with('*');
    let core = pattern.trim_start_matches('*').trim_end_matches('*');
    match (leading, trailing) {
        (true, true) => actual.contains(core),
        (true, false) => actual.ends_with(core),
        (false, true) => actual.starts_with(core),
        (false, false) => actual == pattern,
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Filter, FilterError> {
        let mut children = vec![self.and()?];
        while self.eat(',') {
            children.push(self.and()?);
        }
        Ok(if children.len() == 1 { children.remove(0) } else { Filter::Or(children) })
    }

    fn and(&mut self) -> Result<Filter, FilterError> {
        let mut children = vec![self.term()?];
        while self.eat(';') {
            children.push(self.term()?);
        }
        Ok(if children.len() == 1 { children.remove(0) } else { Filter::And(children) })
    }

    fn term(&mut self) -> Result<Filter, FilterError> {
        if self.eat('(') {
            if self.depth == MAX_FILTER_DEPTH {
                return Err(FilterError::TooDeep);
            }
            self.depth += 1;
            let inner = self.or()?;
            self.depth -= 1;
            if !self.eat(')') {
                return Err(self.unexpected());
            }
            return Ok(inner);
        }
        self.comparison().map(Filter::Compare)
    }

    fn comparison(&mut self) -> Result<Comparison, FilterError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '-') {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        let field: String = self.chars[start..self.pos].iter().collect();
        let operator = self.operator()?;

        self.skip_whitespace();
        let arguments = if self.peek() == Some('(') {
            if !operator.takes_list() {
                return Err(FilterError::ExpectedSingleValue(operator));
            }
            self.pos += 1;
            let mut values = vec![self.value()?];
            while self.eat(',') {
                values.push(self.value()?);
            }
            if !self.eat(')') {
                return Err(self.unexpected());
            }
            values
        } else {
            vec![self.value()?]
        };

        Ok(Comparison { field, operator, arguments })
    }

    fn operator(&mut self) -> Result<Operator, FilterError> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some('!') => {
                self.pos += 1;
                if self.peek() != Some('=') {
                    return Err(self.unexpected());
                }
                self.pos += 1;
            },
            Some('=') => {
                self.pos += 1;
                while self.peek().is_some_and(|c| c.is_ascii_lowercase()) {
                    self.pos += 1;
                }
                if self.peek() != Some('=') {
                    return Err(self.unexpected());
                }
                self.pos += 1;
            },
            _ => return Err(self.unexpected()),
        }
        let token: String = self.chars[start..self.pos].iter().collect();
        Operator::from_token(&token).ok_or(FilterError::UnknownOperator(token))
    }

    fn value(&mut self) -> Result<String, FilterError> {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let start = self.pos;
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.peek() {
                        None => return Err(FilterError::UnterminatedQuote(start)),
                        Some('\\') => {
                            self.pos += 1;
                            let escaped = self.peek().ok_or(FilterError::UnterminatedQuote(start))?;
                            value.push(escaped);
                            self.pos += 1;
                        },
                        Some(c) if c == quote => {
                            self.pos += 1;
                            return Ok(value);
                        },
                        Some(c) => {
                            value.push(c);
                            self.pos += 1;
                        },
                    }
                }
            },
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !matches!(c, ';' | ',' | '(' | ')' | '"' | '\'') && !c.is_whitespace())
                {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.unexpected());
                }
                Ok(self.chars[start..self.pos].iter().collect())
            },
        }
    }

    fn unexpected(&self) -> FilterError {
        match self.peek() {
            Some(c) => FilterError::UnexpectedChar(c, self.pos),
            None => FilterError::UnexpectedEnd,
        }
    }
}
