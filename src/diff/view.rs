//! View strategy: regular views CREATE OR REPLACE; materialized views drop
//! and recreate, because ALTER TABLE ... MODIFY QUERY is unreliable.

use crate::ast::{CreateView, DropObject, ObjectKind, RenameTable, Statement};
use crate::error::{Result, validation_error};

use super::{Catalog, ObjectCategory, Operation, OperationKind, Plan, guard_namespace,
            rename::detect_renames};

fn shape_key(view: &CreateView) -> String {
    let mut masked = view.clone();
    masked.leading_comments.clear();
    masked.trailing_comments.clear();
    masked.name = Default::default();
    masked.or_replace = false;
    Statement::CreateView(masked).to_string()
}

fn guard_view(view: &CreateView) -> Result<()> {
    guard_namespace(
        view.name.database_or("default"),
        &format!("view {}", view.name)
    )
}

/// Materialized views are dropped with DROP TABLE; regular views with
/// DROP VIEW.
fn drop_statement(view: &CreateView) -> DropObject {
    let kind = if view.materialized {
        ObjectKind::Table
    } else {
        ObjectKind::View
    };
    let mut drop = DropObject::new(kind, view.name.clone());
    drop.cluster = view.cluster.clone();
    drop
}

pub(crate) fn diff_views(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    plan: &mut Plan
) -> Result<()> {
    let mut removed: Vec<&CreateView> = Vec::new();
    let mut added: Vec<&CreateView> = Vec::new();

    for (key, target_view) in &target.views {
        match current.views.get(key) {
            None => added.push(*target_view),
            Some(current_view) => diff_one(current_view, target_view, plan)?
        }
    }
    for (key, current_view) in &current.views {
        if !target.views.contains_key(key) {
            removed.push(*current_view);
        }
    }

    let matched = detect_renames(removed, added, |v| shape_key(v));

    for (from, to) in matched.renames {
        guard_view(from)?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Views,
            kind:       OperationKind::Rename,
            object:     from.name.to_string(),
            statements: vec![Statement::RenameTable(RenameTable {
                leading_comments:  Vec::new(),
                trailing_comments: Vec::new(),
                dictionary:        false,
                renames:           vec![(from.name.clone(), to.name.clone())],
                cluster:           to.cluster.clone()
            })]
        });
    }

    for view in matched.added {
        guard_view(view)?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Views,
            kind:       OperationKind::Create,
            object:     view.name.to_string(),
            statements: vec![Statement::CreateView(view.clone())]
        });
    }

    for view in matched.removed {
        guard_view(view)?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Views,
            kind:       OperationKind::Drop,
            object:     view.name.to_string(),
            statements: vec![Statement::Drop(drop_statement(view))]
        });
    }

    Ok(())
}

fn diff_one(current: &CreateView, target: &CreateView, plan: &mut Plan) -> Result<()> {
    if current.materialized != target.materialized {
        return Err(validation_error(format!(
            "view {} changes between regular and materialized; drop it explicitly first",
            current.name
        )));
    }
    if current.cluster != target.cluster {
        return Err(validation_error(format!(
            "view {} changes cluster; cluster transitions are not supported",
            current.name
        )));
    }
    if shape_key(current) == shape_key(target) {
        return Ok(());
    }
    guard_view(current)?;

    if target.materialized {
        plan.operations.push(Operation {
            category:   ObjectCategory::Views,
            kind:       OperationKind::Recreate,
            object:     current.name.to_string(),
            statements: vec![
                Statement::Drop(drop_statement(current)),
                Statement::CreateView(target.clone()),
            ]
        });
    } else {
        let mut replace = target.clone();
        replace.or_replace = true;
        plan.operations.push(Operation {
            category:   ObjectCategory::Views,
            kind:       OperationKind::Replace,
            object:     current.name.to_string(),
            statements: vec![Statement::CreateView(replace)]
        });
    }
    Ok(())
}
