//! ALTER / RENAME / DROP statements.
//!
//! The differ builds these; the parser also accepts them so migration files
//! round-trip through the same AST as schema files.

use super::{CollectionParam, Column, Expr, Ident, Projection, QualifiedName, Settings,
            TableConstraint, TableIndex};

/// `ALTER DATABASE name [ON CLUSTER c] MODIFY COMMENT '...'`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterDatabase {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub name:              Ident,
    pub cluster:           Option<Ident>,
    pub comment:           String
}

/// One sub-operation of an `ALTER TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableOp {
    AddColumn {
        column: Column,
        /// `AFTER other`; `None` with `first` unset appends at the end.
        after:  Option<Ident>,
        first:  bool
    },
    ModifyColumn { column: Column },
    DropColumn { name: Ident },
    RenameColumn { from: Ident, to: Ident },
    CommentColumn { name: Ident, comment: String },
    AddIndex { index: TableIndex },
    DropIndex { name: Ident },
    AddConstraint { constraint: TableConstraint },
    DropConstraint { name: Ident },
    AddProjection { projection: Projection },
    DropProjection { name: Ident },
    ModifyOrderBy { expr: Expr },
    ModifySampleBy { expr: Expr },
    ModifyTtl { expr: Expr },
    RemoveTtl,
    ModifySetting { settings: Settings },
    ResetSetting { names: Vec<Ident> },
    ModifyComment { comment: String }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub name:              QualifiedName,
    pub cluster:           Option<Ident>,
    pub ops:               Vec<AlterTableOp>
}

/// `ALTER NAMED COLLECTION` sub-operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionAlterOp {
    Set(Vec<CollectionParam>),
    Delete(Vec<Ident>)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterNamedCollection {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub name:              Ident,
    pub cluster:           Option<Ident>,
    pub ops:               Vec<CollectionAlterOp>
}

/// `ALTER ROLE name [RENAME TO new] [SETTINGS ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterRole {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub name:              Ident,
    pub cluster:           Option<Ident>,
    pub rename_to:         Option<Ident>,
    pub settings:          Option<Settings>
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameDatabase {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub from:              Ident,
    pub to:                Ident,
    pub cluster:           Option<Ident>
}

/// `RENAME TABLE a TO b [, c TO d]` or `RENAME DICTIONARY ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameTable {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub dictionary:        bool,
    pub renames:           Vec<(QualifiedName, QualifiedName)>,
    pub cluster:           Option<Ident>
}

/// Object class of a DROP statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Database,
    Table,
    Dictionary,
    View,
    NamedCollection,
    Role,
    User,
    Function
}

impl ObjectKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ObjectKind::Database => "DATABASE",
            ObjectKind::Table => "TABLE",
            ObjectKind::Dictionary => "DICTIONARY",
            ObjectKind::View => "VIEW",
            ObjectKind::NamedCollection => "NAMED COLLECTION",
            ObjectKind::Role => "ROLE",
            ObjectKind::User => "USER",
            ObjectKind::Function => "FUNCTION"
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropObject {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub kind:              ObjectKind,
    pub name:              QualifiedName,
    pub if_exists:         bool,
    pub cluster:           Option<Ident>
}

impl DropObject {
    pub fn new(kind: ObjectKind, name: QualifiedName) -> Self {
        Self {
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            kind,
            name,
            if_exists: false,
            cluster: None
        }
    }
}
