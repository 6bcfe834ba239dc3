//! Role, user, and grant strategies.
//!
//! Roles alter and rename in place. Users re-create idempotently with
//! CREATE OR REPLACE on any change. Grants have no name, so rename
//! detection does not apply; set difference drives GRANT/REVOKE emission.

use crate::ast::{AlterRole, CreateRole, CreateUser, DropObject, GrantStatement, ObjectKind,
                 QualifiedName, RevokeStatement, Statement};
use crate::error::Result;

use super::{Catalog, ObjectCategory, Operation, OperationKind, Plan, rename::detect_renames};

fn role_shape(role: &CreateRole) -> String {
    let mut masked = role.clone();
    masked.leading_comments.clear();
    masked.trailing_comments.clear();
    masked.name = Default::default();
    Statement::CreateRole(masked).to_string()
}

pub(crate) fn diff_roles(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    plan: &mut Plan
) -> Result<()> {
    let mut removed: Vec<&CreateRole> = Vec::new();
    let mut added: Vec<&CreateRole> = Vec::new();

    for (name, target_role) in &target.roles {
        match current.roles.get(name) {
            None => added.push(*target_role),
            Some(current_role) => {
                if current_role.settings == target_role.settings {
                    continue;
                }
                if target_role.settings.is_empty() {
                    // SETTINGS cannot be cleared in place.
                    let drop = DropObject::new(
                        ObjectKind::Role,
                        QualifiedName::bare(current_role.name.clone())
                    );
                    plan.operations.push(Operation {
                        category:   ObjectCategory::Roles,
                        kind:       OperationKind::Recreate,
                        object:     name.clone(),
                        statements: vec![
                            Statement::Drop(drop),
                            Statement::CreateRole((*target_role).clone()),
                        ]
                    });
                } else {
                    plan.operations.push(Operation {
                        category:   ObjectCategory::Roles,
                        kind:       OperationKind::Alter,
                        object:     name.clone(),
                        statements: vec![Statement::AlterRole(AlterRole {
                            leading_comments:  Vec::new(),
                            trailing_comments: Vec::new(),
                            name:              current_role.name.clone(),
                            cluster:           current_role.cluster.clone(),
                            rename_to:         None,
                            settings:          Some(target_role.settings.clone())
                        })]
                    });
                }
            }
        }
    }
    for (name, current_role) in &current.roles {
        if !target.roles.contains_key(name) {
            removed.push(*current_role);
        }
    }

    let matched = detect_renames(removed, added, |r| role_shape(r));

    for (from, to) in matched.renames {
        plan.operations.push(Operation {
            category:   ObjectCategory::Roles,
            kind:       OperationKind::Rename,
            object:     from.name.to_string(),
            statements: vec![Statement::AlterRole(AlterRole {
                leading_comments:  Vec::new(),
                trailing_comments: Vec::new(),
                name:              from.name.clone(),
                cluster:           to.cluster.clone(),
                rename_to:         Some(to.name.clone()),
                settings:          None
            })]
        });
    }

    for role in matched.added {
        plan.operations.push(Operation {
            category:   ObjectCategory::Roles,
            kind:       OperationKind::Create,
            object:     role.name.to_string(),
            statements: vec![Statement::CreateRole(role.clone())]
        });
    }

    for role in matched.removed {
        let mut drop = DropObject::new(ObjectKind::Role, QualifiedName::bare(role.name.clone()));
        drop.cluster = role.cluster.clone();
        plan.operations.push(Operation {
            category:   ObjectCategory::Roles,
            kind:       OperationKind::Drop,
            object:     role.name.to_string(),
            statements: vec![Statement::Drop(drop)]
        });
    }

    Ok(())
}

fn user_shape(user: &CreateUser) -> String {
    let mut masked = user.clone();
    masked.leading_comments.clear();
    masked.trailing_comments.clear();
    masked.or_replace = false;
    Statement::CreateUser(masked).to_string()
}

pub(crate) fn diff_users(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    plan: &mut Plan
) -> Result<()> {
    for (name, target_user) in &target.users {
        match current.users.get(name) {
            None => {
                plan.operations.push(Operation {
                    category:   ObjectCategory::Users,
                    kind:       OperationKind::Create,
                    object:     name.clone(),
                    statements: vec![Statement::CreateUser((*target_user).clone())]
                });
            }
            Some(current_user) => {
                if user_shape(current_user) != user_shape(target_user) {
                    // CREATE OR REPLACE USER is idempotent in ClickHouse.
                    let mut replace = (*target_user).clone();
                    replace.or_replace = true;
                    plan.operations.push(Operation {
                        category:   ObjectCategory::Users,
                        kind:       OperationKind::Replace,
                        object:     name.clone(),
                        statements: vec![Statement::CreateUser(replace)]
                    });
                }
            }
        }
    }
    for (name, current_user) in &current.users {
        if !target.users.contains_key(name) {
            let mut drop =
                DropObject::new(ObjectKind::User, QualifiedName::bare(current_user.name.clone()));
            drop.cluster = current_user.cluster.clone();
            plan.operations.push(Operation {
                category:   ObjectCategory::Users,
                kind:       OperationKind::Drop,
                object:     name.clone(),
                statements: vec![Statement::Drop(drop)]
            });
        }
    }
    Ok(())
}

fn grantee_list(grantees: &[crate::ast::Ident]) -> String {
    grantees.iter().map(|g| g.as_str()).collect::<Vec<_>>().join(", ")
}

/// Grant identity: the (privileges, target, grantees) tuple, with
/// privileges and grantees order-normalized.
pub(crate) fn grant_key(grant: &GrantStatement) -> String {
    let mut privileges: Vec<String> = grant
        .privileges
        .iter()
        .map(|p| match &p.columns {
            Some(columns) => format!(
                "{}({})",
                p.name,
                columns.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(",")
            ),
            None => p.name.clone()
        })
        .collect();
    privileges.sort();
    let mut grantees: Vec<&str> = grant.grantees.iter().map(|g| g.as_str()).collect();
    grantees.sort();
    format!(
        "{}|{:?}.{:?}|{}|{}",
        privileges.join(","),
        grant.target.database,
        grant.target.table,
        grantees.join(","),
        grant.with_grant_option
    )
}

pub(crate) fn diff_grants(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    plan: &mut Plan
) -> Result<()> {
    for (key, grant) in &target.grants {
        if !current.grants.contains_key(key) {
            plan.operations.push(Operation {
                category:   ObjectCategory::Grants,
                kind:       OperationKind::Create,
                object:     format!("grant to {}", grantee_list(grant.grantees.as_slice())),
                statements: vec![Statement::Grant((*grant).clone())]
            });
        }
    }
    for (key, grant) in &current.grants {
        if !target.grants.contains_key(key) {
            plan.operations.push(Operation {
                category:   ObjectCategory::Grants,
                kind:       OperationKind::Drop,
                object:     format!("revoke from {}", grantee_list(grant.grantees.as_slice())),
                statements: vec![Statement::Revoke(RevokeStatement {
                    leading_comments:  Vec::new(),
                    trailing_comments: Vec::new(),
                    cluster:           grant.cluster.clone(),
                    privileges:        grant.privileges.clone(),
                    target:            grant.target.clone(),
                    grantees:          grant.grantees.clone()
                })]
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
    fn role_settings_change_is_alter() {
        let p = plan(
            "CREATE ROLE r SETTINGS max_threads = 2;",
            "CREATE ROLE r SETTINGS max_threads = 4;"
        );
        assert_eq!(p.operations.len(), 1);
        assert_eq!(
            p.operations[0].statements[0].to_string(),
            "ALTER ROLE `r` SETTINGS max_threads = 4"
        );
    }

    #[test]
    fn role_rename_is_alter_rename() {
        let p = plan("CREATE ROLE old_r;", "CREATE ROLE new_r;");
        assert_eq!(p.operations.len(), 1);
        assert_eq!(p.operations[0].kind, OperationKind::Rename);
        assert_eq!(
            p.operations[0].statements[0].to_string(),
            "ALTER ROLE `old_r` RENAME TO `new_r`"
        );
    }

    #[test]
    fn user_change_is_create_or_replace() {
        let p = plan(
            "CREATE USER u IDENTIFIED WITH sha256_password BY 'a';",
            "CREATE USER u IDENTIFIED WITH sha256_password BY 'b';"
        );
        assert_eq!(p.operations.len(), 1);
        assert_eq!(p.operations[0].kind, OperationKind::Replace);
        assert!(
            p.operations[0].statements[0]
                .to_string()
                .starts_with("CREATE OR REPLACE USER `u`")
        );
    }

    #[test]
    fn grant_add_and_remove() {
        let p = plan(
            "GRANT SELECT ON app.users TO reader;",
            "GRANT INSERT ON app.users TO writer;"
        );
        assert_eq!(p.operations.len(), 2);
        let texts: Vec<String> = p
            .operations
            .iter()
            .map(|o| o.statements[0].to_string())
            .collect();
        assert!(texts.contains(&"GRANT INSERT ON `app`.`users` TO `writer`".to_string()));
        assert!(texts.contains(&"REVOKE SELECT ON `app`.`users` FROM `reader`".to_string()));
    }

    #[test]
    fn identical_grants_are_no_op() {
        let sql = "GRANT SELECT, INSERT ON app.users TO reader, writer WITH GRANT OPTION;";
        assert!(plan(sql, sql).is_empty());
    }
}
