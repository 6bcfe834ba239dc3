//! `CREATE [MATERIALIZED] VIEW`.

use super::{Engine, Expr, Ident, QualifiedName, Settings};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateView {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub or_replace:        bool,
    pub if_not_exists:     bool,
    pub materialized:      bool,
    pub name:              QualifiedName,
    pub cluster:           Option<Ident>,
    /// `TO db.table` target for materialized views.
    pub to:                Option<QualifiedName>,
    /// Inner engine clauses for materialized views without a TO target.
    pub engine:            Option<Engine>,
    pub order_by:          Option<Expr>,
    pub partition_by:      Option<Expr>,
    pub populate:          bool,
    pub settings:          Settings,
    /// SELECT body, canonicalized token text without the leading `AS`.
    pub query:             String,
    pub comment:           Option<String>
}

impl CreateView {
    pub fn new(name: QualifiedName, query: impl Into<String>) -> Self {
        Self {
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            or_replace: false,
            if_not_exists: false,
            materialized: false,
            name,
            cluster: None,
            to: None,
            engine: None,
            order_by: None,
            partition_by: None,
            populate: false,
            settings: Settings::default(),
            query: query.into(),
            comment: None
        }
    }
}
