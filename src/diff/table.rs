//! Table strategy.
//!
//! Standard engines alter in place, one statement per sub-operation.
//! Integration engines (Kafka, MySQL, ...) accept no column ALTERs, so any
//! change is a drop-and-recreate. Engine and cluster transitions, and
//! PARTITION BY / PRIMARY KEY changes (physically impossible without a
//! rewrite), are fatal.

use crate::ast::{AlterTable, AlterTableOp, Column, CreateTable, DropObject, ObjectKind,
                 RenameTable, Statement};
use crate::error::{Result, validation_error};
use crate::compare::{column_lists_equal, columns_equal, engines_equal};

use super::{Catalog, DiffOptions, ObjectCategory, Operation, OperationKind, Plan,
            guard_namespace, rename::detect_renames};

fn shape_key(table: &CreateTable) -> String {
    let mut masked = table.clone();
    masked.leading_comments.clear();
    masked.trailing_comments.clear();
    masked.name = Default::default();
    Statement::CreateTable(masked).to_string()
}

pub(crate) fn diff_tables(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    options: &DiffOptions,
    plan: &mut Plan
) -> Result<()> {
    let mut removed: Vec<&CreateTable> = Vec::new();
    let mut added: Vec<&CreateTable> = Vec::new();

    for (key, target_table) in &target.tables {
        match current.tables.get(key) {
            None => added.push(*target_table),
            Some(current_table) => diff_one(current_table, target_table, options, plan)?
        }
    }
    for (key, current_table) in &current.tables {
        if !target.tables.contains_key(key) {
            removed.push(*current_table);
        }
    }

    let matched = detect_renames(removed, added, |t| shape_key(t));

    for (from, to) in matched.renames {
        guard_table(from, options)?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Tables,
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

    for table in matched.added {
        guard_table(table, options)?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Tables,
            kind:       OperationKind::Create,
            object:     table.name.to_string(),
            statements: vec![Statement::CreateTable(table.clone())]
        });
    }

    for table in matched.removed {
        guard_table(table, options)?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Tables,
            kind:       OperationKind::Drop,
            object:     table.name.to_string(),
            statements: vec![Statement::Drop(drop_statement(table))]
        });
    }

    Ok(())
}

fn guard_table(table: &CreateTable, options: &DiffOptions) -> Result<()> {
    guard_namespace(
        table.name.database_or(&options.default_database),
        &format!("table {}", table.name)
    )
}

fn drop_statement(table: &CreateTable) -> DropObject {
    let mut drop = DropObject::new(ObjectKind::Table, table.name.clone());
    drop.cluster = table.cluster.clone();
    drop
}

fn diff_one(
    current: &CreateTable,
    target: &CreateTable,
    options: &DiffOptions,
    plan: &mut Plan
) -> Result<()> {
    if current.cluster != target.cluster {
        return Err(validation_error(format!(
            "table {} changes cluster ({} -> {}); cluster transitions are not supported",
            current.name,
            current.cluster.as_deref().unwrap_or("none"),
            target.cluster.as_deref().unwrap_or("none")
        )));
    }
    if !engines_equal(&current.engine, &target.engine) {
        let detail = if current.engine.family() == target.engine.family() {
            "replication or parameter change"
        } else {
            "engine family change"
        };
        return Err(validation_error(format!(
            "table {} changes engine ({} -> {}): {}; engine transitions are not supported",
            current.name, current.engine.name, target.engine.name, detail
        )));
    }
    if current.partition_by != target.partition_by {
        return Err(validation_error(format!(
            "table {} changes PARTITION BY; repartitioning is not supported",
            current.name
        )));
    }
    if current.primary_key != target.primary_key {
        return Err(validation_error(format!(
            "table {} changes PRIMARY KEY; key changes are not supported",
            current.name
        )));
    }

    let ops = collect_alter_ops(current, target);
    if ops.is_empty() {
        return Ok(());
    }
    guard_table(current, options)?;

    if target.engine.is_integration() {
        plan.operations.push(Operation {
            category:   ObjectCategory::Tables,
            kind:       OperationKind::Recreate,
            object:     current.name.to_string(),
            statements: vec![
                Statement::Drop(drop_statement(current)),
                Statement::CreateTable(target.clone()),
            ]
        });
        return Ok(());
    }

    // One ALTER statement per sub-operation keeps failures resumable at
    // the finest granularity the executor tracks.
    let statements = ops
        .into_iter()
        .map(|op| {
            Statement::AlterTable(AlterTable {
                leading_comments:  Vec::new(),
                trailing_comments: Vec::new(),
                name:              current.name.clone(),
                cluster:           current.cluster.clone(),
                ops:               vec![op]
            })
        })
        .collect();
    plan.operations.push(Operation {
        category: ObjectCategory::Tables,
        kind: OperationKind::Alter,
        object: current.name.to_string(),
        statements
    });
    Ok(())
}

fn collect_alter_ops(current: &CreateTable, target: &CreateTable) -> Vec<AlterTableOp> {
    let mut ops = Vec::new();
    diff_columns(&current.columns, &target.columns, &mut ops);

    for index in &target.indexes {
        match current.indexes.iter().find(|i| i.name == index.name) {
            None => ops.push(AlterTableOp::AddIndex {
                index: index.clone()
            }),
            Some(existing) if existing != index => {
                ops.push(AlterTableOp::DropIndex {
                    name: index.name.clone()
                });
                ops.push(AlterTableOp::AddIndex {
                    index: index.clone()
                });
            }
            Some(_) => {}
        }
    }
    for index in &current.indexes {
        if !target.indexes.iter().any(|i| i.name == index.name) {
            ops.push(AlterTableOp::DropIndex {
                name: index.name.clone()
            });
        }
    }

    for constraint in &target.constraints {
        match current.constraints.iter().find(|c| c.name == constraint.name) {
            None => ops.push(AlterTableOp::AddConstraint {
                constraint: constraint.clone()
            }),
            Some(existing) if existing != constraint => {
                ops.push(AlterTableOp::DropConstraint {
                    name: constraint.name.clone()
                });
                ops.push(AlterTableOp::AddConstraint {
                    constraint: constraint.clone()
                });
            }
            Some(_) => {}
        }
    }
    for constraint in &current.constraints {
        if !target.constraints.iter().any(|c| c.name == constraint.name) {
            ops.push(AlterTableOp::DropConstraint {
                name: constraint.name.clone()
            });
        }
    }

    for projection in &target.projections {
        match current.projections.iter().find(|p| p.name == projection.name) {
            None => ops.push(AlterTableOp::AddProjection {
                projection: projection.clone()
            }),
            Some(existing) if existing != projection => {
                ops.push(AlterTableOp::DropProjection {
                    name: projection.name.clone()
                });
                ops.push(AlterTableOp::AddProjection {
                    projection: projection.clone()
                });
            }
            Some(_) => {}
        }
    }
    for projection in &current.projections {
        if !target.projections.iter().any(|p| p.name == projection.name) {
            ops.push(AlterTableOp::DropProjection {
                name: projection.name.clone()
            });
        }
    }

    if current.order_by != target.order_by {
        if let Some(expr) = &target.order_by {
            ops.push(AlterTableOp::ModifyOrderBy { expr: expr.clone() });
        }
    }
    if current.sample_by != target.sample_by {
        if let Some(expr) = &target.sample_by {
            ops.push(AlterTableOp::ModifySampleBy { expr: expr.clone() });
        }
    }
    if current.ttl != target.ttl {
        match &target.ttl {
            Some(expr) => ops.push(AlterTableOp::ModifyTtl { expr: expr.clone() }),
            None => ops.push(AlterTableOp::RemoveTtl)
        }
    }

    if current.settings != target.settings {
        let mut changed = crate::ast::Settings::default();
        for (key, value) in &target.settings {
            if current.settings.get(key) != Some(value) {
                changed.insert(key.clone(), value.clone());
            }
        }
        if !changed.is_empty() {
            ops.push(AlterTableOp::ModifySetting { settings: changed });
        }
        let reset: Vec<_> = current
            .settings
            .keys()
            .filter(|key| !target.settings.contains_key(*key))
            .cloned()
            .collect();
        if !reset.is_empty() {
            ops.push(AlterTableOp::ResetSetting { names: reset });
        }
    }

    if current.comment != target.comment {
        ops.push(AlterTableOp::ModifyComment {
            comment: target.comment.clone().unwrap_or_default()
        });
    }

    ops
}

fn diff_columns(current: &[Column], target: &[Column], ops: &mut Vec<AlterTableOp>) {
    // Cross-form equality (flattened vs Nested) produces no operations.
    if column_lists_equal(current, target) {
        return;
    }

    let current_names: Vec<&str> = current.iter().map(|c| c.name.as_str()).collect();
    let target_names: Vec<&str> = target.iter().map(|c| c.name.as_str()).collect();

    let removed: Vec<&Column> = current
        .iter()
        .filter(|c| !target_names.contains(&c.name.as_str()))
        .collect();
    let added: Vec<&Column> = target
        .iter()
        .filter(|c| !current_names.contains(&c.name.as_str()))
        .collect();

    // Same column body under a different name is a rename.
    let matched = detect_renames(removed, added, |column| {
        let mut masked = (*column).clone();
        masked.name = Default::default();
        masked.to_string()
    });

    let mut renamed_to: Vec<&str> = Vec::new();
    for (from, to) in &matched.renames {
        renamed_to.push(to.name.as_str());
        ops.push(AlterTableOp::RenameColumn {
            from: from.name.clone(),
            to:   to.name.clone()
        });
    }

    for column in matched.removed {
        ops.push(AlterTableOp::DropColumn {
            name: column.name.clone()
        });
    }

    for column in matched.added {
        let position = target
            .iter()
            .position(|c| c.name == column.name)
            .expect("added column is in target");
        if position == 0 {
            ops.push(AlterTableOp::AddColumn {
                column: column.clone(),
                after:  None,
                first:  true
            });
        } else {
            ops.push(AlterTableOp::AddColumn {
                column: column.clone(),
                after:  Some(target[position - 1].name.clone()),
                first:  false
            });
        }
    }

    // Columns present on both sides: attribute changes.
    for target_column in target {
        if renamed_to.contains(&target_column.name.as_str()) {
            continue;
        }
        let Some(current_column) = current.iter().find(|c| c.name == target_column.name) else {
            continue;
        };
        if columns_equal(current_column, target_column) {
            continue;
        }
        let only_comment_differs = {
            let mut current_masked = current_column.clone();
            let mut target_masked = target_column.clone();
            current_masked.comment = None;
            target_masked.comment = None;
            columns_equal(&current_masked, &target_masked)
        };
        if only_comment_differs {
            ops.push(AlterTableOp::CommentColumn {
                name:    target_column.name.clone(),
                comment: target_column.comment.clone().unwrap_or_default()
            });
        } else {
            ops.push(AlterTableOp::ModifyColumn {
                column: target_column.clone()
            });
        }
    }
}
