//! `CREATE DATABASE`.

use super::{Engine, Ident};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateDatabase {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub if_not_exists:     bool,
    pub name:              Ident,
    pub cluster:           Option<Ident>,
    pub engine:            Option<Engine>,
    pub comment:           Option<String>
}

impl CreateDatabase {
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            leading_comments:  Vec::new(),
            trailing_comments: Vec::new(),
            if_not_exists:     false,
            name:              name.into(),
            cluster:           None,
            engine:            None,
            comment:           None
        }
    }
}
