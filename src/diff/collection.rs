//! Named collection strategy: parameter and override-flag changes become
//! ALTER NAMED COLLECTION SET / DELETE.

use crate::ast::{AlterNamedCollection, CollectionAlterOp, CreateNamedCollection, DropObject,
                 ObjectKind, QualifiedName, Statement};
use crate::error::Result;

use super::{Catalog, ObjectCategory, Operation, OperationKind, Plan};

pub(crate) fn diff_collections(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    plan: &mut Plan
) -> Result<()> {
    for (name, target_collection) in &target.collections {
        match current.collections.get(name) {
            None => {
                plan.operations.push(Operation {
                    category:   ObjectCategory::NamedCollections,
                    kind:       OperationKind::Create,
                    object:     name.clone(),
                    statements: vec![Statement::CreateNamedCollection(
                        (*target_collection).clone()
                    )]
                });
            }
            Some(current_collection) => {
                diff_one(current_collection, target_collection, plan);
            }
        }
    }
    for (name, current_collection) in &current.collections {
        if !target.collections.contains_key(name) {
            let mut drop = DropObject::new(
                ObjectKind::NamedCollection,
                QualifiedName::bare(current_collection.name.clone())
            );
            drop.cluster = current_collection.cluster.clone();
            plan.operations.push(Operation {
                category:   ObjectCategory::NamedCollections,
                kind:       OperationKind::Drop,
                object:     name.clone(),
                statements: vec![Statement::Drop(drop)]
            });
        }
    }
    Ok(())
}

fn diff_one(
    current: &CreateNamedCollection,
    target: &CreateNamedCollection,
    plan: &mut Plan
) {
    let mut set = Vec::new();
    for param in &target.params {
        match current.params.iter().find(|p| p.key == param.key) {
            None => set.push(param.clone()),
            Some(existing) if existing != param => set.push(param.clone()),
            Some(_) => {}
        }
    }
    let delete: Vec<_> = current
        .params
        .iter()
        .filter(|p| !target.params.iter().any(|t| t.key == p.key))
        .map(|p| p.key.clone())
        .collect();

    if set.is_empty() && delete.is_empty() {
        return;
    }

    let mut ops = Vec::new();
    if !set.is_empty() {
        ops.push(CollectionAlterOp::Set(set));
    }
    if !delete.is_empty() {
        ops.push(CollectionAlterOp::Delete(delete));
    }
    plan.operations.push(Operation {
        category:   ObjectCategory::NamedCollections,
        kind:       OperationKind::Alter,
        object:     current.name.to_string(),
        statements: vec![Statement::AlterNamedCollection(AlterNamedCollection {
            leading_comments:  Vec::new(),
            trailing_comments: Vec::new(),
            name:              current.name.clone(),
            cluster:           current.cluster.clone(),
            ops
        })]
    });
}

#[cfg(test)]
mod tests {
    use crate::diff::{OperationKind, diff};
    use crate::parser::parse_statements;

    fn plan(current: &str, target: &str) -> crate::diff::Plan {
        diff(&parse_statements(current).unwrap(), &parse_statements(target).unwrap()).unwrap()
    }

    #[test]
    fn parameter_change_sets_and_deletes() {
        let p = plan(
            "CREATE NAMED COLLECTION c AS a = 1, stale = 'x';",
            "CREATE NAMED COLLECTION c AS a = 2;"
        );
        assert_eq!(p.operations.len(), 1);
        assert_eq!(p.operations[0].kind, OperationKind::Alter);
        assert_eq!(
            p.operations[0].statements[0].to_string(),
            "ALTER NAMED COLLECTION `c` SET a = 2 DELETE stale"
        );
    }

    #[test]
    fn override_flag_change_is_a_set() {
        let p = plan(
            "CREATE NAMED COLLECTION c AS a = 1;",
            "CREATE NAMED COLLECTION c AS a = 1 OVERRIDABLE;"
        );
        assert_eq!(
            p.operations[0].statements[0].to_string(),
            "ALTER NAMED COLLECTION `c` SET a = 1 OVERRIDABLE"
        );
    }

    #[test]
    fn unchanged_collection_is_no_op() {
        let sql = "CREATE NAMED COLLECTION c AS a = 1 OVERRIDABLE, b = 'x';";
        assert!(plan(sql, sql).is_empty());
    }
}
