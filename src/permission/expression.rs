//! Permission expression syntax.
//!
//! ```text
//! expr   := term ( OR term )*
//! term   := factor ( AND factor )*
//! factor := NOT factor | '(' expr ')' | check
//! check  := word+            (e.g. "allow all", "has role admin")
//! ```
//!
//! Keywords are case-insensitive. Consecutive non-keyword words form one check
//! name, normalized to single spaces.

use std::fmt;

/// Error produced while parsing a permission expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// The expression is empty or blank.
    #[error("empty permission expression")]
    Empty,
    /// A token appeared where it is not allowed.
    #[error("unexpected '{0}' in permission expression")]
    UnexpectedToken(String),
    /// The expression ended where an operand was required.
    #[error("permission expression ends unexpectedly")]
    UnexpectedEnd,
    /// A parenthesis is not matched.
    #[error("unbalanced parentheses in permission expression")]
    UnbalancedParens,
    /// The expression names a check that is not registered.
    #[error("unknown check '{0}' in permission expression")]
    UnknownCheck(String),
}

/// A parsed permission expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A named check.
    Check(String),
    /// Both operands must allow.
    And(Box<Expression>, Box<Expression>),
    /// Either operand must allow.
    Or(Box<Expression>, Box<Expression>),
    /// Inverts the operand.
    Not(Box<Expression>),
}

impl Expression {
    /// Parses an expression.
    ///
    /// ```rust
    /// use jsonapi_graph::permission::Expression;
    ///
    /// let expr = Expression::parse("is owner OR NOT (is guest and is banned)").unwrap();
    /// assert_eq!(expr.to_string(), "(is owner OR NOT (is guest AND is banned))");
    /// assert_eq!(expr.check_names(), vec!["is owner", "is guest", "is banned"]);
    /// ```
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(source);
        if tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let mut parser = Parser { tokens, position: 0 };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(Token::Close) => Err(ExpressionError::UnbalancedParens),
            Some(token) => Err(ExpressionError::UnexpectedToken(token.to_string())),
        }
    }

    /// Returns every check name referenced, in order of appearance.
    pub fn check_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expression::Check(name) => names.push(name),
            Expression::And(l, r) | Expression::Or(l, r) => {
                l.collect_names(names);
                r.collect_names(names);
            },
            Expression::Not(inner) => inner.collect_names(names),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Check(name) => write!(f, "{}", name),
            Expression::And(l, r) => write!(f, "({} AND {})", l, r),
            Expression::Or(l, r) => write!(f, "({} OR {})", l, r),
            Expression::Not(inner) => write!(f, "NOT {}", inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Not,
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::Word(w) => write!(f, "{}", w),
        }
    }
}

fn tokenize(source: &str) -> Vec<Token> {
    let spaced = source.replace('(', " ( ").replace(')', " ) ");
    spaced
        .split_whitespace()
        .map(|word| match word.to_ascii_lowercase().as_str() {
            "(" => Token::Open,
            ")" => Token::Close,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Word(word.to_string()),
        })
        .collect()
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn parse_or(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_factor()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_factor()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expression, ExpressionError> {
        match self.advance() {
            None => Err(ExpressionError::UnexpectedEnd),
            Some(Token::Not) => Ok(Expression::Not(Box::new(self.parse_factor()?))),
            Some(Token::Open) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(ExpressionError::UnbalancedParens),
                }
            },
            Some(Token::Word(first)) => {
                let mut words = vec![first];
                while let Some(Token::Word(_)) = self.peek() {
                    if let Some(Token::Word(word)) = self.advance() {
                        words.push(word);
                    }
                }
                Ok(Expression::Check(words.join(" ")))
            },
            Some(Token::Close) => Err(ExpressionError::UnbalancedParens),
            Some(token) => Err(ExpressionError::UnexpectedToken(token.to_string())),
        }
    }
}
