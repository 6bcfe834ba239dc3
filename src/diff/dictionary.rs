//! Dictionary strategy: ClickHouse has no ALTER DICTIONARY, so any change
//! becomes CREATE OR REPLACE with the full target definition.

use crate::ast::{CreateDictionary, DropObject, ObjectKind, RenameTable, Statement};
use crate::error::Result;

use super::{Catalog, ObjectCategory, Operation, OperationKind, Plan, guard_namespace,
            rename::detect_renames};

fn shape_key(dictionary: &CreateDictionary) -> String {
    let mut masked = dictionary.clone();
    masked.leading_comments.clear();
    masked.trailing_comments.clear();
    masked.name = Default::default();
    masked.or_replace = false;
    Statement::CreateDictionary(masked).to_string()
}

fn guard_dictionary(dictionary: &CreateDictionary) -> Result<()> {
    guard_namespace(
        dictionary.name.database_or("default"),
        &format!("dictionary {}", dictionary.name)
    )
}

pub(crate) fn diff_dictionaries(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    plan: &mut Plan
) -> Result<()> {
    let mut removed: Vec<&CreateDictionary> = Vec::new();
    let mut added: Vec<&CreateDictionary> = Vec::new();

    for (key, target_dictionary) in &target.dictionaries {
        match current.dictionaries.get(key) {
            None => added.push(*target_dictionary),
            Some(current_dictionary) => {
                if shape_key(current_dictionary) != shape_key(target_dictionary) {
                    guard_dictionary(current_dictionary)?;
                    let mut replace = (*target_dictionary).clone();
                    replace.or_replace = true;
                    plan.operations.push(Operation {
                        category:   ObjectCategory::Dictionaries,
                        kind:       OperationKind::Replace,
                        object:     current_dictionary.name.to_string(),
                        statements: vec![Statement::CreateDictionary(replace)]
                    });
                }
            }
        }
    }
    for (key, current_dictionary) in &current.dictionaries {
        if !target.dictionaries.contains_key(key) {
            removed.push(*current_dictionary);
        }
    }

    let matched = detect_renames(removed, added, |d| shape_key(d));

    for (from, to) in matched.renames {
        guard_dictionary(from)?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Dictionaries,
            kind:       OperationKind::Rename,
            object:     from.name.to_string(),
            statements: vec![Statement::RenameTable(RenameTable {
                leading_comments:  Vec::new(),
                trailing_comments: Vec::new(),
                dictionary:        true,
                renames:           vec![(from.name.clone(), to.name.clone())],
                cluster:           to.cluster.clone()
            })]
        });
    }

    for dictionary in matched.added {
        guard_dictionary(dictionary)?;
        plan.operations.push(Operation {
            category:   ObjectCategory::Dictionaries,
            kind:       OperationKind::Create,
            object:     dictionary.name.to_string(),
            statements: vec![Statement::CreateDictionary(dictionary.clone())]
        });
    }

    for dictionary in matched.removed {
        guard_dictionary(dictionary)?;
        let mut drop = DropObject::new(ObjectKind::Dictionary, dictionary.name.clone());
        drop.cluster = dictionary.cluster.clone();
        plan.operations.push(Operation {
            category:   ObjectCategory::Dictionaries,
            kind:       OperationKind::Drop,
            object:     dictionary.name.to_string(),
            statements: vec![Statement::Drop(drop)]
        });
    }

    Ok(())
}
