//! Function strategy: expression changes drop and recreate, since
//! CREATE OR REPLACE FUNCTION is not available on all supported servers.

use crate::ast::{CreateFunction, DropObject, ObjectKind, QualifiedName, Statement};
use crate::error::Result;

use super::{Catalog, ObjectCategory, Operation, OperationKind, Plan};

fn function_changed(current: &CreateFunction, target: &CreateFunction) -> bool {
    current.params != target.params || current.body != target.body
}

fn drop_statement(function: &CreateFunction) -> DropObject {
    let mut drop =
        DropObject::new(ObjectKind::Function, QualifiedName::bare(function.name.clone()));
    drop.cluster = function.cluster.clone();
    drop
}

pub(crate) fn diff_functions(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    plan: &mut Plan
) -> Result<()> {
    for (name, target_function) in &target.functions {
        match current.functions.get(name) {
            None => {
                plan.operations.push(Operation {
                    category:   ObjectCategory::Functions,
                    kind:       OperationKind::Create,
                    object:     name.clone(),
                    statements: vec![Statement::CreateFunction((*target_function).clone())]
                });
            }
            Some(current_function) => {
                if function_changed(current_function, target_function) {
                    plan.operations.push(Operation {
                        category:   ObjectCategory::Functions,
                        kind:       OperationKind::Recreate,
                        object:     name.clone(),
                        statements: vec![
                            Statement::Drop(drop_statement(current_function)),
                            Statement::CreateFunction((*target_function).clone()),
                        ]
                    });
                }
            }
        }
    }
    for (name, current_function) in &current.functions {
        if !target.functions.contains_key(name) {
            plan.operations.push(Operation {
                category:   ObjectCategory::Functions,
                kind:       OperationKind::Drop,
                object:     name.clone(),
                statements: vec![Statement::Drop(drop_statement(current_function))]
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::diff::{OperationKind, diff};
    use crate::parser::parse_statements;

    fn plan(current: &str, target: &str) -> crate::diff::Plan {
        diff(&parse_statements(current).unwrap(), &parse_statements(target).unwrap()).unwrap()
    }

    #[test]
    fn body_change_recreates() {
        let p = plan(
            "CREATE FUNCTION f AS (x) -> x * 2;",
            "CREATE FUNCTION f AS (x) -> x * 3;"
        );
        assert_eq!(p.operations.len(), 1);
        assert_eq!(p.operations[0].kind, OperationKind::Recreate);
        assert_eq!(p.operations[0].statements[0].to_string(), "DROP FUNCTION `f`");
        assert_eq!(
            p.operations[0].statements[1].to_string(),
            "CREATE FUNCTION `f` AS (`x`) -> `x` * 3"
        );
    }

    #[test]
    fn unchanged_function_is_no_op() {
        let sql = "CREATE FUNCTION f AS (x, y) -> x + y;";
        assert!(plan(sql, sql).is_empty());
    }
}
