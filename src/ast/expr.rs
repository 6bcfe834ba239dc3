//! Expression nodes for defaults, TTLs, key clauses, and grant bodies.
//!
//! The grammar parses with explicit precedence, lowest to highest:
//! `CASE` -> `OR` -> `AND` -> `NOT` -> comparison -> additive ->
//! multiplicative -> unary -> primary. Window functions are a postfix
//! `OVER (...)` attached to function calls.

use super::Ident;

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Raw numeric spelling, sign included when parsed as part of a literal.
    Number(String),
    String(String),
    Null
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Like,
    NotLike,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "OR",
            BinaryOperator::And => "AND",
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::Like => "LIKE",
            BinaryOperator::NotLike => "NOT LIKE",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not
}

/// One `WHEN ... THEN ...` arm of a CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub when: Expr,
    pub then: Expr
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifier reference; multiple segments for `db.table.column`.
    Ident(Vec<Ident>),
    Literal(Literal),
    /// `*` as an argument, e.g. `count(*)`.
    Wildcard,
    /// Function call, optionally windowed: `sum(x) OVER (...)`. The window
    /// body is kept as canonicalized token text.
    Function {
        name: Ident,
        args: Vec<Expr>,
        over: Option<String>
    },
    BinaryOp {
        left:  Box<Expr>,
        op:    BinaryOperator,
        right: Box<Expr>
    },
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },
    Case {
        operand:  Option<Box<Expr>>,
        branches: Vec<CaseBranch>,
        else_arm: Option<Box<Expr>>
    },
    /// Parenthesized list: `(a, b)` in ORDER BY or IN lists of size > 1.
    Tuple(Vec<Expr>),
    /// `[a, b, c]`.
    Array(Vec<Expr>),
    /// `INTERVAL 90 DAY`.
    Interval { value: Box<Expr>, unit: Ident },
    Between {
        expr:    Box<Expr>,
        negated: bool,
        low:     Box<Expr>,
        high:    Box<Expr>
    },
    InList {
        expr:    Box<Expr>,
        negated: bool,
        list:    Vec<Expr>
    },
    IsNull { expr: Box<Expr>, negated: bool }
}

impl Expr {
    pub fn ident(name: impl Into<Ident>) -> Self {
        Expr::Ident(vec![name.into()])
    }

    pub fn number(text: impl Into<String>) -> Self {
        Expr::Literal(Literal::Number(text.into()))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(text.into()))
    }
}
