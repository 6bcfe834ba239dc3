//! Column definitions and the table-internal clauses that ride with them:
//! skip indexes, constraints, and projections.

use smallvec::SmallVec;

use super::{DataType, Expr, Ident};

/// Codec chains are short (typically one or two entries).
pub type CodecList = SmallVec<[CodecSpec; 2]>;

/// Which default-family keyword introduced the column expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    Default,
    Materialized,
    Ephemeral,
    Alias
}

impl DefaultKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DefaultKind::Default => "DEFAULT",
            DefaultKind::Materialized => "MATERIALIZED",
            DefaultKind::Ephemeral => "EPHEMERAL",
            DefaultKind::Alias => "ALIAS"
        }
    }
}

/// `DEFAULT expr` / `MATERIALIZED expr` / `EPHEMERAL [expr]` / `ALIAS expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefault {
    pub kind: DefaultKind,
    /// EPHEMERAL may omit the expression.
    pub expr: Option<Expr>
}

/// One codec inside a `CODEC(...)` chain, e.g. `ZSTD(3)` or `Delta`.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecSpec {
    pub name:   Ident,
    pub params: Vec<Expr>
}

/// A `CODEC(a, b, ...)` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Codec {
    pub specs: CodecList
}

/// A column definition. Attributes are stored in their canonical order:
/// default family, codec, TTL, comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name:      Ident,
    pub data_type: DataType,
    pub default:   Option<ColumnDefault>,
    pub codec:     Option<Codec>,
    pub ttl:       Option<Expr>,
    pub comment:   Option<String>
}

impl Column {
    pub fn new(name: impl Into<Ident>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            default: None,
            codec: None,
            ttl: None,
            comment: None
        }
    }
}

/// `INDEX name expr TYPE type(params) GRANULARITY n`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableIndex {
    pub name:        Ident,
    pub expr:        Expr,
    pub index_type:  Ident,
    pub type_params: Vec<Expr>,
    pub granularity: Option<u64>
}

/// `CONSTRAINT name CHECK expr` (or ASSUME).
#[derive(Debug, Clone, PartialEq)]
pub struct TableConstraint {
    pub name:   Ident,
    pub assume: bool,
    pub expr:   Expr
}

/// `PROJECTION name (SELECT ...)`. The projection body is kept as
/// canonicalized token text, like view SELECT bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub name:  Ident,
    pub query: String
}
