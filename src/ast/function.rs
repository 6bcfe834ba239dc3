//! `CREATE FUNCTION name AS (params) -> expression`.

use super::{Expr, Ident};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFunction {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub if_not_exists:     bool,
    pub name:              Ident,
    pub cluster:           Option<Ident>,
    pub params:            Vec<Ident>,
    pub body:              Expr
}
