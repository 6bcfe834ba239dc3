//! `CREATE TABLE` and `CREATE NAMED COLLECTION`.

use super::{Column, Expr, Ident, Projection, QualifiedName, Settings, TableConstraint,
            TableIndex};

/// `ENGINE = Name(params...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub name:   Ident,
    pub params: Vec<Expr>
}

impl Engine {
    pub fn named(name: impl Into<Ident>) -> Self {
        Self {
            name:   name.into(),
            params: Vec::new()
        }
    }

    /// Engine family: the name with any `Replicated` prefix stripped, so
    /// `ReplicatedMergeTree` and `MergeTree` share a family while `Kafka`
    /// and `MergeTree` do not.
    pub fn family(&self) -> &str {
        self.name.strip_prefix("Replicated").unwrap_or(&self.name)
    }

    /// Integration engines proxy an external system and do not accept
    /// column ALTERs; any change to such a table is a drop-and-recreate.
    pub fn is_integration(&self) -> bool {
        matches!(
            self.name.as_str(),
            "Kafka"
                | "MySQL"
                | "PostgreSQL"
                | "RabbitMQ"
                | "S3"
                | "S3Queue"
                | "MongoDB"
                | "NATS"
                | "JDBC"
                | "ODBC"
                | "HDFS"
                | "AzureBlobStorage"
                | "DeltaLake"
                | "Hudi"
                | "Iceberg"
                | "ExternalDistributed"
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub or_replace:        bool,
    pub if_not_exists:     bool,
    pub name:              QualifiedName,
    pub cluster:           Option<Ident>,
    pub columns:           Vec<Column>,
    pub indexes:           Vec<TableIndex>,
    pub constraints:       Vec<TableConstraint>,
    pub projections:       Vec<Projection>,
    pub engine:            Engine,
    pub order_by:          Option<Expr>,
    pub partition_by:      Option<Expr>,
    pub primary_key:       Option<Expr>,
    pub sample_by:         Option<Expr>,
    pub ttl:               Option<Expr>,
    pub settings:          Settings,
    pub comment:           Option<String>
}

impl CreateTable {
    pub fn new(name: QualifiedName, engine: Engine) -> Self {
        Self {
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            or_replace: false,
            if_not_exists: false,
            name,
            cluster: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            projections: Vec::new(),
            engine,
            order_by: None,
            partition_by: None,
            primary_key: None,
            sample_by: None,
            ttl: None,
            settings: Settings::default(),
            comment: None
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// One `key = value [OVERRIDABLE | NOT OVERRIDABLE]` parameter of a named
/// collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionParam {
    pub key:         Ident,
    pub value:       Expr,
    /// Per-parameter override flag; `None` inherits the server default.
    pub overridable: Option<bool>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateNamedCollection {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub if_not_exists:     bool,
    pub name:              Ident,
    pub cluster:           Option<Ident>,
    pub params:            Vec<CollectionParam>,
    pub comment:           Option<String>
}
