//! Typed AST for the supported ClickHouse DDL surface.
//!
//! Every statement node carries its attached leading and trailing comments
//! and enough fidelity to round-trip through the canonical formatter:
//! `parse(format(ast))` yields a structurally equal tree.
//!
//! Identity is semantic. Backtick quoting, whitespace, and keyword case are
//! normalized away by the parser and reintroduced by the formatter; they do
//! not participate in equality.

pub mod access;
pub mod alter;
pub mod column;
pub mod database;
pub mod dictionary;
pub mod expr;
pub mod function;
pub mod table;
pub mod types;
pub mod view;

use std::fmt;

use compact_str::CompactString;
use indexmap::IndexMap;

pub use self::{
    access::{CreateRole, CreateUser, GrantStatement, GrantTarget, HostClause, HostKind,
             Privilege, RevokeStatement, UserIdentification},
    alter::{AlterDatabase, AlterNamedCollection, AlterRole, AlterTable, AlterTableOp,
            CollectionAlterOp, DropObject, ObjectKind, RenameDatabase, RenameTable},
    column::{Codec, CodecSpec, Column, ColumnDefault, DefaultKind, Projection, TableConstraint,
             TableIndex},
    database::CreateDatabase,
    dictionary::{CreateDictionary, DictionaryColumn, DictionaryLayout, DictionaryLifetime,
                 DictionarySource},
    expr::{BinaryOperator, CaseBranch, Expr, Literal, UnaryOperator},
    function::CreateFunction,
    table::{CreateNamedCollection, CollectionParam, CreateTable, Engine},
    types::{DataType, NestedColumn, TupleElement, TypeParam},
    view::CreateView
};

/// Identifier as written, without quoting. Comparisons are case-sensitive.
pub type Ident = CompactString;

/// Settings bag. Insertion order is preserved for emission; equality is
/// order-insensitive (`IndexMap` compares as a set of pairs).
pub type Settings = IndexMap<Ident, Expr>;

/// A possibly database-qualified object name.
///
/// The database part is optional; `db.name` and `name` with an ambient
/// database are distinct values here and resolved by the differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QualifiedName {
    pub database: Option<Ident>,
    pub name:     Ident
}

impl QualifiedName {
    pub fn bare(name: impl Into<Ident>) -> Self {
        Self {
            database: None,
            name:     name.into()
        }
    }

    pub fn qualified(database: impl Into<Ident>, name: impl Into<Ident>) -> Self {
        Self {
            database: Some(database.into()),
            name:     name.into()
        }
    }

    /// Database part, or `default_db` when unqualified.
    pub fn database_or<'a>(&'a self, default_db: &'a str) -> &'a str {
        self.database.as_deref().unwrap_or(default_db)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{}.{}", db, self.name),
            None => write!(f, "{}", self.name)
        }
    }
}

/// Access to the comment arrays every statement node carries.
pub trait Commented {
    fn leading_comments(&self) -> &[String];
    fn trailing_comments(&self) -> &[String];
    fn leading_comments_mut(&mut self) -> &mut Vec<String>;
    fn trailing_comments_mut(&mut self) -> &mut Vec<String>;
}

macro_rules! impl_commented {
    ($($ty:ty),+ $(,)?) => {
        $(impl Commented for $ty {
            fn leading_comments(&self) -> &[String] {
                &self.leading_comments
            }

            fn trailing_comments(&self) -> &[String] {
                &self.trailing_comments
            }

            fn leading_comments_mut(&mut self) -> &mut Vec<String> {
                &mut self.leading_comments
            }

            fn trailing_comments_mut(&mut self) -> &mut Vec<String> {
                &mut self.trailing_comments
            }
        })+
    };
}

impl_commented!(
    CreateDatabase,
    CreateTable,
    CreateDictionary,
    CreateView,
    CreateNamedCollection,
    CreateRole,
    CreateUser,
    CreateFunction,
    GrantStatement,
    RevokeStatement,
    AlterDatabase,
    AlterTable,
    AlterNamedCollection,
    AlterRole,
    RenameDatabase,
    RenameTable,
    DropObject,
    RawStatement
);

/// A statement whose body is kept as canonicalized token text rather than a
/// typed tree: `SET`, `SELECT`, `WITH`, `ATTACH`, `DETACH`. These appear in
/// migration files but are never diffed structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatement {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    /// Whitespace-normalized token rendering of the statement body,
    /// excluding the terminating semicolon.
    pub text:              String
}

/// Tagged union over every supported statement kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateDatabase(CreateDatabase),
    CreateTable(CreateTable),
    CreateDictionary(CreateDictionary),
    CreateView(CreateView),
    CreateNamedCollection(CreateNamedCollection),
    CreateRole(CreateRole),
    CreateUser(CreateUser),
    CreateFunction(CreateFunction),
    Grant(GrantStatement),
    Revoke(RevokeStatement),
    AlterDatabase(AlterDatabase),
    AlterTable(AlterTable),
    AlterNamedCollection(AlterNamedCollection),
    AlterRole(AlterRole),
    RenameDatabase(RenameDatabase),
    RenameTable(RenameTable),
    Drop(DropObject),
    Raw(RawStatement)
}

impl Statement {
    /// Comment accessor shared across all variants.
    pub fn commented(&self) -> &dyn Commented {
        match self {
            Statement::CreateDatabase(s) => s,
            Statement::CreateTable(s) => s,
            Statement::CreateDictionary(s) => s,
            Statement::CreateView(s) => s,
            Statement::CreateNamedCollection(s) => s,
            Statement::CreateRole(s) => s,
            Statement::CreateUser(s) => s,
            Statement::CreateFunction(s) => s,
            Statement::Grant(s) => s,
            Statement::Revoke(s) => s,
            Statement::AlterDatabase(s) => s,
            Statement::AlterTable(s) => s,
            Statement::AlterNamedCollection(s) => s,
            Statement::AlterRole(s) => s,
            Statement::RenameDatabase(s) => s,
            Statement::RenameTable(s) => s,
            Statement::Drop(s) => s,
            Statement::Raw(s) => s
        }
    }

    pub fn commented_mut(&mut self) -> &mut dyn Commented {
        match self {
            Statement::CreateDatabase(s) => s,
            Statement::CreateTable(s) => s,
            Statement::CreateDictionary(s) => s,
            Statement::CreateView(s) => s,
            Statement::CreateNamedCollection(s) => s,
            Statement::CreateRole(s) => s,
            Statement::CreateUser(s) => s,
            Statement::CreateFunction(s) => s,
            Statement::Grant(s) => s,
            Statement::Revoke(s) => s,
            Statement::AlterDatabase(s) => s,
            Statement::AlterTable(s) => s,
            Statement::AlterNamedCollection(s) => s,
            Statement::AlterRole(s) => s,
            Statement::RenameDatabase(s) => s,
            Statement::RenameTable(s) => s,
            Statement::Drop(s) => s,
            Statement::Raw(s) => s
        }
    }
}
