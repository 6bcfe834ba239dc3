//! ALTER, DROP, and RENAME rules.

use crate::ast::{AlterDatabase, AlterNamedCollection, AlterRole, AlterTable, AlterTableOp,
                 CollectionAlterOp, DropObject, ObjectKind, QualifiedName, RenameDatabase,
                 RenameTable, Statement};
use crate::error::Result;

use super::{Parser,
            column::{parse_column, parse_projection, parse_table_constraint, parse_table_index},
            expr::parse_expr,
            table::{parse_collection_param, parse_settings_list}};

pub fn parse_alter(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("ALTER")?;
    if p.check_keyword("DATABASE") {
        return parse_alter_database(p);
    }
    if p.check_keyword("NAMED") {
        return parse_alter_named_collection(p);
    }
    if p.check_keyword("ROLE") {
        return parse_alter_role(p);
    }
    if p.check_keyword("TABLE") {
        return parse_alter_table(p);
    }
    Err(p.expected("one of: TABLE, DATABASE, NAMED COLLECTION, ROLE"))
}

fn parse_alter_database(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("DATABASE")?;
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    p.expect_keyword("MODIFY")?;
    p.expect_keyword("COMMENT")?;
    let comment = p.parse_string()?;
    Ok(Statement::AlterDatabase(AlterDatabase {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        name,
        cluster,
        comment
    }))
}

fn parse_alter_named_collection(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("NAMED")?;
    p.expect_keyword("COLLECTION")?;
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    let mut ops = Vec::new();
    loop {
        if p.try_keyword("SET") {
            let mut params = vec![parse_collection_param(p)?];
            while p.try_punct(',') {
                params.push(parse_collection_param(p)?);
            }
            ops.push(CollectionAlterOp::Set(params));
        } else if p.try_keyword("DELETE") {
            let mut keys = vec![p.parse_ident()?];
            while p.try_punct(',') {
                keys.push(p.parse_ident()?);
            }
            ops.push(CollectionAlterOp::Delete(keys));
        } else {
            break;
        }
    }
    if ops.is_empty() {
        return Err(p.expected("SET or DELETE"));
    }
    Ok(Statement::AlterNamedCollection(AlterNamedCollection {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        name,
        cluster,
        ops
    }))
}

fn parse_alter_role(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("ROLE")?;
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    let rename_to = if p.try_keywords(&["RENAME", "TO"]) {
        Some(p.parse_ident()?)
    } else {
        None
    };
    let settings = if p.try_keyword("SETTINGS") {
        Some(parse_settings_list(p)?)
    } else {
        None
    };
    Ok(Statement::AlterRole(AlterRole {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        name,
        cluster,
        rename_to,
        settings
    }))
}

fn parse_alter_table(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("TABLE")?;
    let name = p.parse_qualified_name()?;
    let cluster = p.parse_on_cluster()?;
    let mut ops = vec![parse_alter_table_op(p)?];
    while p.try_punct(',') {
        ops.push(parse_alter_table_op(p)?);
    }
    Ok(Statement::AlterTable(AlterTable {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        name,
        cluster,
        ops
    }))
}

fn parse_alter_table_op(p: &mut Parser) -> Result<AlterTableOp> {
    if p.try_keyword("ADD") {
        if p.try_keyword("COLUMN") {
            p.try_keywords(&["IF", "NOT", "EXISTS"]);
            let column = parse_column(p)?;
            let first = p.try_keyword("FIRST");
            let after = if !first && p.try_keyword("AFTER") {
                Some(p.parse_ident()?)
            } else {
                None
            };
            return Ok(AlterTableOp::AddColumn {
                column,
                after,
                first
            });
        }
        if p.check_keyword("INDEX") {
            return Ok(AlterTableOp::AddIndex {
                index: parse_table_index(p)?
            });
        }
        if p.check_keyword("CONSTRAINT") {
            return Ok(AlterTableOp::AddConstraint {
                constraint: parse_table_constraint(p)?
            });
        }
        if p.check_keyword("PROJECTION") {
            return Ok(AlterTableOp::AddProjection {
                projection: parse_projection(p)?
            });
        }
        return Err(p.expected("one of: COLUMN, INDEX, CONSTRAINT, PROJECTION"));
    }

    if p.try_keyword("DROP") {
        if p.try_keyword("COLUMN") {
            p.try_keywords(&["IF", "EXISTS"]);
            return Ok(AlterTableOp::DropColumn {
                name: p.parse_ident()?
            });
        }
        if p.try_keyword("INDEX") {
            return Ok(AlterTableOp::DropIndex {
                name: p.parse_ident()?
            });
        }
        if p.try_keyword("CONSTRAINT") {
            return Ok(AlterTableOp::DropConstraint {
                name: p.parse_ident()?
            });
        }
        if p.try_keyword("PROJECTION") {
            return Ok(AlterTableOp::DropProjection {
                name: p.parse_ident()?
            });
        }
        return Err(p.expected("one of: COLUMN, INDEX, CONSTRAINT, PROJECTION"));
    }

    if p.try_keyword("RENAME") {
        p.expect_keyword("COLUMN")?;
        let from = p.parse_ident()?;
        p.expect_keyword("TO")?;
        let to = p.parse_ident()?;
        return Ok(AlterTableOp::RenameColumn { from, to });
    }

    if p.try_keyword("COMMENT") {
        p.expect_keyword("COLUMN")?;
        let name = p.parse_ident()?;
        let comment = p.parse_string()?;
        return Ok(AlterTableOp::CommentColumn { name, comment });
    }

    if p.try_keyword("MODIFY") {
        if p.try_keyword("COLUMN") {
            return Ok(AlterTableOp::ModifyColumn {
                column: parse_column(p)?
            });
        }
        if p.try_keywords(&["ORDER", "BY"]) {
            return Ok(AlterTableOp::ModifyOrderBy {
                expr: parse_expr(p)?
            });
        }
        if p.try_keywords(&["SAMPLE", "BY"]) {
            return Ok(AlterTableOp::ModifySampleBy {
                expr: parse_expr(p)?
            });
        }
        if p.try_keyword("TTL") {
            return Ok(AlterTableOp::ModifyTtl {
                expr: parse_expr(p)?
            });
        }
        if p.try_keyword("SETTING") {
            return Ok(AlterTableOp::ModifySetting {
                settings: parse_settings_list(p)?
            });
        }
        if p.try_keyword("COMMENT") {
            return Ok(AlterTableOp::ModifyComment {
                comment: p.parse_string()?
            });
        }
        return Err(p.expected("one of: COLUMN, ORDER BY, SAMPLE BY, TTL, SETTING, COMMENT"));
    }

    if p.try_keywords(&["REMOVE", "TTL"]) {
        return Ok(AlterTableOp::RemoveTtl);
    }

    if p.try_keyword("RESET") {
        p.expect_keyword("SETTING")?;
        let mut names = vec![p.parse_ident()?];
        while p.try_punct(',') {
            names.push(p.parse_ident()?);
        }
        return Ok(AlterTableOp::ResetSetting { names });
    }

    Err(p.expected("an ALTER TABLE operation"))
}

pub fn parse_drop(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("DROP")?;
    let kind = if p.try_keyword("DATABASE") {
        ObjectKind::Database
    } else if p.try_keyword("TABLE") {
        ObjectKind::Table
    } else if p.try_keyword("DICTIONARY") {
        ObjectKind::Dictionary
    } else if p.try_keyword("VIEW") {
        ObjectKind::View
    } else if p.try_keywords(&["NAMED", "COLLECTION"]) {
        ObjectKind::NamedCollection
    } else if p.try_keyword("ROLE") {
        ObjectKind::Role
    } else if p.try_keyword("USER") {
        ObjectKind::User
    } else if p.try_keyword("FUNCTION") {
        ObjectKind::Function
    } else {
        return Err(p.expected(
            "one of: DATABASE, TABLE, DICTIONARY, VIEW, NAMED COLLECTION, ROLE, USER, FUNCTION"
        ));
    };
    let if_exists = p.try_keywords(&["IF", "EXISTS"]);
    let name = match kind {
        ObjectKind::Table | ObjectKind::Dictionary | ObjectKind::View => {
            p.parse_qualified_name()?
        }
        _ => QualifiedName::bare(p.parse_ident()?)
    };
    let cluster = p.parse_on_cluster()?;
    // SYNC changes drop latency, not the schema; accepted and dropped.
    p.try_keyword("SYNC");
    Ok(Statement::Drop(DropObject {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        kind,
        name,
        if_exists,
        cluster
    }))
}

pub fn parse_rename(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("RENAME")?;
    if p.try_keyword("DATABASE") {
        let from = p.parse_ident()?;
        p.expect_keyword("TO")?;
        let to = p.parse_ident()?;
        let cluster = p.parse_on_cluster()?;
        return Ok(Statement::RenameDatabase(RenameDatabase {
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            from,
            to,
            cluster
        }));
    }
    let dictionary = if p.try_keyword("DICTIONARY") {
        true
    } else {
        p.expect_keyword("TABLE")?;
        false
    };
    let mut renames = Vec::new();
    loop {
        let from = p.parse_qualified_name()?;
        p.expect_keyword("TO")?;
        let to = p.parse_qualified_name()?;
        renames.push((from, to));
        if !p.try_punct(',') {
            break;
        }
    }
    let cluster = p.parse_on_cluster()?;
    Ok(Statement::RenameTable(RenameTable {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        dictionary,
        renames,
        cluster
    }))
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_single;

    #[test]
    fn alter_table_column_ops() {
        let s = parse_single(
            "ALTER TABLE app.users ADD COLUMN email String AFTER name, DROP COLUMN legacy;"
        )
        .unwrap();
        assert_eq!(
            s.to_string(),
            "ALTER TABLE `app`.`users` ADD COLUMN `email` String AFTER `name`, DROP COLUMN `legacy`"
        );
    }

    #[test]
    fn alter_table_modify_ops() {
        let s = parse_single("ALTER TABLE t MODIFY COLUMN v Nullable(String) DEFAULT NULL;").unwrap();
        assert_eq!(
            s.to_string(),
            "ALTER TABLE `t` MODIFY COLUMN `v` Nullable(String) DEFAULT NULL"
        );
        let s = parse_single("ALTER TABLE t MODIFY TTL d + INTERVAL 30 DAY;").unwrap();
        assert_eq!(s.to_string(), "ALTER TABLE `t` MODIFY TTL `d` + INTERVAL 30 DAY");
        let s = parse_single("ALTER TABLE t REMOVE TTL;").unwrap();
        assert_eq!(s.to_string(), "ALTER TABLE `t` REMOVE TTL");
    }

    #[test]
    fn alter_database_comment() {
        let s = parse_single("ALTER DATABASE app MODIFY COMMENT 'new';").unwrap();
        assert_eq!(s.to_string(), "ALTER DATABASE `app` MODIFY COMMENT 'new'");
    }

    #[test]
    fn alter_named_collection() {
        let s = parse_single("ALTER NAMED COLLECTION creds SET url = 'x' OVERRIDABLE DELETE old_key;")
            .unwrap();
        assert_eq!(
            s.to_string(),
            "ALTER NAMED COLLECTION `creds` SET url = 'x' OVERRIDABLE DELETE old_key"
        );
    }

    #[test]
    fn alter_role_rename() {
        let s = parse_single("ALTER ROLE reader RENAME TO viewer;").unwrap();
        assert_eq!(s.to_string(), "ALTER ROLE `reader` RENAME TO `viewer`");
    }

    #[test]
    fn drops() {
        let s = parse_single("DROP TABLE IF EXISTS app.users ON CLUSTER main SYNC;").unwrap();
        assert_eq!(
            s.to_string(),
            "DROP TABLE IF EXISTS `app`.`users` ON CLUSTER `main`"
        );
        let s = parse_single("DROP NAMED COLLECTION creds;").unwrap();
        assert_eq!(s.to_string(), "DROP NAMED COLLECTION `creds`");
    }

    #[test]
    fn renames() {
        let s = parse_single("RENAME DATABASE old_db TO new_db;").unwrap();
        assert_eq!(s.to_string(), "RENAME DATABASE `old_db` TO `new_db`");
        let s = parse_single("RENAME TABLE a.t1 TO a.t2, b.x TO b.y;").unwrap();
        assert_eq!(
            s.to_string(),
            "RENAME TABLE `a`.`t1` TO `a`.`t2`, `b`.`x` TO `b`.`y`"
        );
        let s = parse_single("RENAME DICTIONARY d.old TO d.new;").unwrap();
        assert_eq!(s.to_string(), "RENAME DICTIONARY `d`.`old` TO `d`.`new`");
    }
}
