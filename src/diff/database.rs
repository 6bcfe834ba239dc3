//! Database strategy: CREATE, ALTER MODIFY COMMENT, RENAME, DROP; engine
//! and cluster transitions are fatal.

use crate::ast::{AlterDatabase, CreateDatabase, DropObject, Engine, ObjectKind, QualifiedName,
                 RenameDatabase, Statement};
use crate::error::{Result, validation_error};

use super::{Catalog, ObjectCategory, Operation, OperationKind, Plan, guard_namespace,
            rename::detect_renames};

/// The server reports `Atomic` for databases created without an explicit
/// engine.
fn effective_engine(db: &CreateDatabase) -> Engine {
    db.engine.clone().unwrap_or_else(|| Engine::named("Atomic"))
}

fn shape_key(db: &CreateDatabase) -> String {
    let mut masked = db.clone();
    masked.leading_comments.clear();
    masked.trailing_comments.clear();
    masked.name = "".into();
    masked.engine = Some(effective_engine(db));
    Statement::CreateDatabase(masked).to_string()
}

pub(crate) fn diff_databases(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    plan: &mut Plan
) -> Result<()> {
    let mut removed: Vec<&CreateDatabase> = Vec::new();
    let mut added: Vec<&CreateDatabase> = Vec::new();

    for (name, target_db) in &target.databases {
        match current.databases.get(name) {
            None => added.push(*target_db),
            Some(current_db) => diff_one(current_db, target_db, plan)?
        }
    }
    for (name, current_db) in &current.databases {
        if !target.databases.contains_key(name) {
            removed.push(*current_db);
        }
    }

    let matched = detect_renames(removed, added, |db| shape_key(db));

    for (from, to) in matched.renames {
        guard_namespace(&from.name, "database")?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Databases,
            kind:       OperationKind::Rename,
            object:     from.name.to_string(),
            statements: vec![Statement::RenameDatabase(RenameDatabase {
                leading_comments:  Vec::new(),
                trailing_comments: Vec::new(),
                from:              from.name.clone(),
                to:                to.name.clone(),
                cluster:           to.cluster.clone()
            })]
        });
    }

    for db in matched.added {
        guard_namespace(&db.name, "database")?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Databases,
            kind:       OperationKind::Create,
            object:     db.name.to_string(),
            statements: vec![Statement::CreateDatabase(db.clone())]
        });
    }

    for db in matched.removed {
        guard_namespace(&db.name, "database")?;
        let mut drop = DropObject::new(ObjectKind::Database, QualifiedName::bare(db.name.clone()));
        drop.cluster = db.cluster.clone();
        plan.operations.push(Operation {
            category:   ObjectCategory::Databases,
            kind:       OperationKind::Drop,
            object:     db.name.to_string(),
            statements: vec![Statement::Drop(drop)]
        });
    }

    Ok(())
}

fn diff_one(current: &CreateDatabase, target: &CreateDatabase, plan: &mut Plan) -> Result<()> {
    if current.cluster != target.cluster {
        return Err(validation_error(format!(
            "database {} changes cluster ({} -> {}); cluster transitions are not supported",
            current.name,
            current.cluster.as_deref().unwrap_or("none"),
            target.cluster.as_deref().unwrap_or("none")
        )));
    }
    let current_engine = effective_engine(current);
    let target_engine = effective_engine(target);
    if current_engine != target_engine {
        return Err(validation_error(format!(
            "database {} changes engine ({} -> {}); engine transitions are not supported",
            current.name, current_engine.name, target_engine.name
        )));
    }
    if current.comment != target.comment {
        guard_namespace(&current.name, "database")?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Databases,
            kind:       OperationKind::Alter,
            object:     current.name.to_string(),
            statements: vec![Statement::AlterDatabase(AlterDatabase {
                leading_comments:  Vec::new(),
                trailing_comments: Vec::new(),
                name:              current.name.clone(),
                cluster:           current.cluster.clone(),
                comment:           target.comment.clone().unwrap_or_default()
            })]
        });
    }
    Ok(())
}
