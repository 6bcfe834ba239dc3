//! Roles, users, grants.

use super::{Ident, Settings};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRole {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub if_not_exists:     bool,
    pub name:              Ident,
    pub cluster:           Option<Ident>,
    pub settings:          Settings
}

/// `IDENTIFIED WITH kind [BY 'value']`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentification {
    pub kind:  Ident,
    pub value: Option<String>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Any,
    Local,
    Ip,
    Name,
    Regexp,
    Like
}

impl HostKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            HostKind::Any => "ANY",
            HostKind::Local => "LOCAL",
            HostKind::Ip => "IP",
            HostKind::Name => "NAME",
            HostKind::Regexp => "REGEXP",
            HostKind::Like => "LIKE"
        }
    }
}

/// One `HOST ...` clause member.
#[derive(Debug, Clone, PartialEq)]
pub struct HostClause {
    pub kind:  HostKind,
    pub value: Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateUser {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub or_replace:        bool,
    pub if_not_exists:     bool,
    pub name:              Ident,
    pub cluster:           Option<Ident>,
    pub identification:    Option<UserIdentification>,
    pub hosts:             Vec<HostClause>,
    /// `DEFAULT ROLE r1, r2` / `DEFAULT ROLE ALL` (empty vec) when set.
    pub default_roles:     Option<Vec<Ident>>,
    pub default_database:  Option<Ident>,
    /// `GRANTEES user, ...` / `GRANTEES ANY` (empty vec) when set.
    pub grantees:          Option<Vec<Ident>>,
    pub settings:          Settings
}

/// One granted privilege, optionally column-scoped: `SELECT(a, b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Privilege {
    pub name:    String,
    pub columns: Option<Vec<Ident>>
}

/// Grant scope: `*.*`, `db.*`, or `db.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GrantTarget {
    /// `None` means `*`.
    pub database: Option<Ident>,
    /// `None` means `*`.
    pub table:    Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrantStatement {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub cluster:           Option<Ident>,
    pub privileges:        Vec<Privilege>,
    pub target:            GrantTarget,
    pub grantees:          Vec<Ident>,
    pub with_grant_option: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevokeStatement {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub cluster:           Option<Ident>,
    pub privileges:        Vec<Privilege>,
    pub target:            GrantTarget,
    pub grantees:          Vec<Ident>
}
