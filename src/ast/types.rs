//! The ClickHouse data type algebra.

use super::Ident;

/// A type parameter as it appears inside `Type(...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeParam {
    /// Integer or decimal literal, raw spelling preserved.
    Number(String),
    /// Single-quoted string, e.g. a timezone name.
    String(String),
    /// Bare identifier, e.g. an unquoted timezone or a column reference.
    Ident(Ident),
    /// `'label' = value` member of an Enum type.
    EnumValue { name: String, value: Option<i64> },
    /// Nested call such as the expressions inside `AggregateFunction(...)`.
    Function { name: Ident, params: Vec<TypeParam> }
}

/// One element of a `Tuple(...)` type; the name is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
    pub name:      Option<Ident>,
    pub data_type: DataType
}

/// One column of a `Nested(...)` type.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedColumn {
    pub name:      Ident,
    pub data_type: DataType
}

/// Structural data type. Equality is derived element-wise; the
/// ClickHouse-specific canonicalization rules (Decimal aliases, DateTime64
/// timezone tolerance) live in the `compare` module, not here.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Simple { name: Ident, params: Vec<TypeParam> },
    Nullable(Box<DataType>),
    Array(Box<DataType>),
    Tuple(Vec<TupleElement>),
    Map(Box<DataType>, Box<DataType>),
    LowCardinality(Box<DataType>),
    Nested(Vec<NestedColumn>)
}

impl DataType {
    /// Parameterless simple type.
    pub fn simple(name: impl Into<Ident>) -> Self {
        DataType::Simple {
            name:   name.into(),
            params: Vec::new()
        }
    }

    /// Name of the outermost constructor, for diagnostics.
    pub fn constructor(&self) -> &str {
        match self {
            DataType::Simple { name, .. } => name.as_str(),
            DataType::Nullable(_) => "Nullable",
            DataType::Array(_) => "Array",
            DataType::Tuple(_) => "Tuple",
            DataType::Map(_, _) => "Map",
            DataType::LowCardinality(_) => "LowCardinality",
            DataType::Nested(_) => "Nested"
        }
    }
}
