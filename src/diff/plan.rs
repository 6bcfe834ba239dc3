//! Plan entities: ordered operations with category and kind tags.

use crate::ast::Statement;
use crate::format::render_statement;

/// Object category, in creation order. Destructions run in the reverse of
/// this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ObjectCategory {
    Databases,
    NamedCollections,
    Roles,
    Users,
    Grants,
    Tables,
    Dictionaries,
    Views,
    Functions
}

impl ObjectCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectCategory::Databases => "database",
            ObjectCategory::NamedCollections => "named collection",
            ObjectCategory::Roles => "role",
            ObjectCategory::Users => "user",
            ObjectCategory::Grants => "grant",
            ObjectCategory::Tables => "table",
            ObjectCategory::Dictionaries => "dictionary",
            ObjectCategory::Views => "view",
            ObjectCategory::Functions => "function"
        }
    }
}

/// What an operation does to its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Alter,
    /// `CREATE OR REPLACE`.
    Replace,
    /// Paired `DROP` + `CREATE`.
    Recreate,
    Rename,
    Drop
}

impl OperationKind {
    /// Intra-category phase: CREATE, then ALTER/REPLACE/RECREATE, then
    /// RENAME, then DROP.
    pub fn phase(&self) -> u8 {
        match self {
            OperationKind::Create => 0,
            OperationKind::Alter | OperationKind::Replace | OperationKind::Recreate => 1,
            OperationKind::Rename => 2,
            OperationKind::Drop => 3
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Alter => "alter",
            OperationKind::Replace => "replace",
            OperationKind::Recreate => "recreate",
            OperationKind::Rename => "rename",
            OperationKind::Drop => "drop"
        }
    }
}

/// One planned change: the statements that implement it plus the tags the
/// ordering discipline sorts by.
#[derive(Debug, Clone)]
pub struct Operation {
    pub category:   ObjectCategory,
    pub kind:       OperationKind,
    /// Display name of the object, for diagnostics and plan output.
    pub object:     String,
    pub statements: Vec<Statement>
}

/// Ordered sequence of operations.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub operations: Vec<Operation>
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// All statements in execution order.
    pub fn statements(&self) -> Vec<&Statement> {
        self.operations
            .iter()
            .flat_map(|op| op.statements.iter())
            .collect()
    }

    /// Render the plan's statements as migration-file DDL.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, statement) in self.statements().into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&render_statement(statement));
        }
        out
    }

    /// Apply the ordering discipline: non-destructive operations ascend by
    /// category (CREATE, then ALTER/REPLACE/RECREATE, then RENAME within
    /// each), destructive operations follow, descending by category. The
    /// sort is stable, so same-key operations keep their insertion order.
    pub fn sort(&mut self) {
        self.operations.sort_by_key(|op| match op.kind {
            OperationKind::Drop => (1u8, u8::MAX - op.category as u8, op.kind.phase()),
            _ => (0u8, op.category as u8, op.kind.phase())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(category: ObjectCategory, kind: OperationKind, object: &str) -> Operation {
        Operation {
            category,
            kind,
            object: object.to_string(),
            statements: Vec::new()
        }
    }

    #[test]
    fn sort_follows_the_ordering_discipline() {
        let mut plan = Plan {
            operations: vec![
                op(ObjectCategory::Views, OperationKind::Create, "v"),
                op(ObjectCategory::Databases, OperationKind::Drop, "olddb"),
                op(ObjectCategory::Tables, OperationKind::Drop, "oldt"),
                op(ObjectCategory::Tables, OperationKind::Alter, "t"),
                op(ObjectCategory::Tables, OperationKind::Create, "t2"),
                op(ObjectCategory::Databases, OperationKind::Create, "db"),
                op(ObjectCategory::Roles, OperationKind::Rename, "r"),
            ]
        };
        plan.sort();
        let keys: Vec<(ObjectCategory, OperationKind)> =
            plan.operations.iter().map(|o| (o.category, o.kind)).collect();
        assert_eq!(
            keys,
            vec![
                (ObjectCategory::Databases, OperationKind::Create),
                (ObjectCategory::Roles, OperationKind::Rename),
                (ObjectCategory::Tables, OperationKind::Create),
                (ObjectCategory::Tables, OperationKind::Alter),
                (ObjectCategory::Views, OperationKind::Create),
                (ObjectCategory::Tables, OperationKind::Drop),
                (ObjectCategory::Databases, OperationKind::Drop),
            ]
        );
    }
}
