//! `CREATE DICTIONARY`.

use smallvec::SmallVec;

use super::{DataType, Expr, Ident, QualifiedName, Settings};

/// Primary keys are short ordered identifier lists.
pub type KeyList = SmallVec<[Ident; 4]>;

/// One dictionary attribute column.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryColumn {
    pub name:         Ident,
    pub data_type:    DataType,
    pub default:      Option<Expr>,
    pub expression:   Option<Expr>,
    pub hierarchical: bool,
    pub injective:    bool,
    pub is_object_id: bool
}

/// `SOURCE(NAME(k v ...))`.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionarySource {
    pub name:   Ident,
    pub params: Vec<(Ident, Expr)>
}

/// `LAYOUT(NAME(k v ...))`.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryLayout {
    pub name:   Ident,
    pub params: Vec<(Ident, Expr)>
}

/// `LIFETIME(n)` or `LIFETIME(MIN a MAX b)`.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionaryLifetime {
    Single(u64),
    MinMax { min: u64, max: u64 }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateDictionary {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub or_replace:        bool,
    pub if_not_exists:     bool,
    pub name:              QualifiedName,
    pub cluster:           Option<Ident>,
    pub columns:           Vec<DictionaryColumn>,
    pub primary_key:       KeyList,
    pub source:            Option<DictionarySource>,
    pub layout:            Option<DictionaryLayout>,
    pub lifetime:          Option<DictionaryLifetime>,
    pub settings:          Settings,
    pub comment:           Option<String>
}
