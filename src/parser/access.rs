//! Roles, users, grants, revokes.

use crate::ast::{CreateRole, CreateUser, GrantStatement, GrantTarget, HostClause, HostKind,
                 Ident, Privilege, RevokeStatement, Statement, UserIdentification};
use crate::error::Result;
use crate::lexer::TokenKind;

use super::{Parser, table::parse_settings_list};

pub fn parse_create_role(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("ROLE")?;
    let if_not_exists = p.try_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    let settings = if p.try_keyword("SETTINGS") {
        parse_settings_list(p)?
    } else {
        Default::default()
    };
    Ok(Statement::CreateRole(CreateRole {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        if_not_exists,
        name,
        cluster,
        settings
    }))
}

pub fn parse_create_user(p: &mut Parser, or_replace: bool) -> Result<Statement> {
    p.expect_keyword("USER")?;
    let if_not_exists = p.try_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;

    let mut user = CreateUser {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        or_replace,
        if_not_exists,
        name,
        cluster: None,
        identification: None,
        hosts: Vec::new(),
        default_roles: None,
        default_database: None,
        grantees: None,
        settings: Default::default()
    };
    user.cluster = p.parse_on_cluster()?;

    loop {
        if p.try_keyword("IDENTIFIED") {
            let kind: Ident = if p.try_keyword("WITH") {
                p.parse_ident()?
            } else {
                // Bare `IDENTIFIED BY` defaults to the server's password type.
                "sha256_password".into()
            };
            let value = if p.try_keyword("BY") {
                Some(p.parse_string()?)
            } else {
                None
            };
            user.identification = Some(UserIdentification { kind, value });
        } else if p.try_keyword("HOST") {
            loop {
                user.hosts.push(parse_host_clause(p)?);
                if !p.try_punct(',') {
                    break;
                }
            }
        } else if p.try_keywords(&["DEFAULT", "ROLE"]) {
            if p.try_keyword("ALL") {
                user.default_roles = Some(Vec::new());
            } else {
                let mut roles = vec![p.parse_ident()?];
                while p.try_punct(',') {
                    roles.push(p.parse_ident()?);
                }
                user.default_roles = Some(roles);
            }
        } else if p.try_keywords(&["DEFAULT", "DATABASE"]) {
            user.default_database = Some(p.parse_ident()?);
        } else if p.try_keyword("GRANTEES") {
            if p.try_keyword("ANY") {
                user.grantees = Some(Vec::new());
            } else {
                let mut grantees = vec![p.parse_ident()?];
                while p.try_punct(',') {
                    grantees.push(p.parse_ident()?);
                }
                user.grantees = Some(grantees);
            }
        } else if p.try_keyword("SETTINGS") {
            user.settings = parse_settings_list(p)?;
        } else {
            break;
        }
    }

    Ok(Statement::CreateUser(user))
}

fn parse_host_clause(p: &mut Parser) -> Result<HostClause> {
    let kind = if p.try_keyword("ANY") {
        return Ok(HostClause {
            kind:  HostKind::Any,
            value: None
        });
    } else if p.try_keyword("LOCAL") {
        return Ok(HostClause {
            kind:  HostKind::Local,
            value: None
        });
    } else if p.try_keyword("IP") {
        HostKind::Ip
    } else if p.try_keyword("NAME") {
        HostKind::Name
    } else if p.try_keyword("REGEXP") {
        HostKind::Regexp
    } else if p.try_keyword("LIKE") {
        HostKind::Like
    } else {
        return Err(p.expected("one of: ANY, LOCAL, IP, NAME, REGEXP, LIKE"));
    };
    Ok(HostClause {
        kind,
        value: Some(p.parse_string()?)
    })
}

pub fn parse_grant(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("GRANT")?;
    let cluster = p.parse_on_cluster()?;
    let privileges = parse_privileges(p)?;
    p.expect_keyword("ON")?;
    let target = parse_grant_target(p)?;
    p.expect_keyword("TO")?;
    let mut grantees = vec![p.parse_ident()?];
    while p.try_punct(',') {
        grantees.push(p.parse_ident()?);
    }
    let with_grant_option = p.try_keywords(&["WITH", "GRANT", "OPTION"]);
    Ok(Statement::Grant(GrantStatement {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        cluster,
        privileges,
        target,
        grantees,
        with_grant_option
    }))
}

pub fn parse_revoke(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("REVOKE")?;
    let cluster = p.parse_on_cluster()?;
    let privileges = parse_privileges(p)?;
    p.expect_keyword("ON")?;
    let target = parse_grant_target(p)?;
    p.expect_keyword("FROM")?;
    let mut grantees = vec![p.parse_ident()?];
    while p.try_punct(',') {
        grantees.push(p.parse_ident()?);
    }
    Ok(Statement::Revoke(RevokeStatement {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        cluster,
        privileges,
        target,
        grantees
    }))
}

/// Privilege list. A privilege name is one or more keywords (`SELECT`,
/// `ALTER TABLE`, ...) optionally followed by a column list; names are
/// uppercased for identity.
fn parse_privileges(p: &mut Parser) -> Result<Vec<Privilege>> {
    let mut privileges = Vec::new();
    loop {
        let mut words = vec![p.parse_ident()?];
        while p.peek().is_some_and(|t| t.kind == TokenKind::Ident) && !p.check_keyword("ON") {
            words.push(p.parse_ident()?);
        }
        let name = words
            .iter()
            .map(|w| w.to_uppercase())
            .collect::<Vec<_>>()
            .join(" ");
        let columns = if p.try_punct('(') {
            let mut columns = vec![p.parse_ident()?];
            while p.try_punct(',') {
                columns.push(p.parse_ident()?);
            }
            p.expect_punct(')')?;
            Some(columns)
        } else {
            None
        };
        privileges.push(Privilege { name, columns });
        if !p.try_punct(',') {
            break;
        }
    }
    Ok(privileges)
}

/// `*.*`, `db.*`, or `db.table`.
fn parse_grant_target(p: &mut Parser) -> Result<GrantTarget> {
    if p.try_punct('*') {
        p.expect_punct('.')?;
        p.expect_punct('*')?;
        return Ok(GrantTarget {
            database: None,
            table:    None
        });
    }
    let database = p.parse_ident()?;
    p.expect_punct('.')?;
    if p.try_punct('*') {
        Ok(GrantTarget {
            database: Some(database),
            table:    None
        })
    } else {
        Ok(GrantTarget {
            database: Some(database),
            table:    Some(p.parse_ident()?)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_single;

    #[test]
    fn role_with_settings() {
        let s = parse_single("CREATE ROLE reader SETTINGS max_memory_usage = 10000000;").unwrap();
        assert_eq!(
            s.to_string(),
            "CREATE ROLE `reader` SETTINGS max_memory_usage = 10000000"
        );
    }

    #[test]
    fn user_full_surface() {
        let s = parse_single(
            "CREATE USER app IDENTIFIED WITH sha256_password BY 'secret' \
             HOST IP '10.0.0.0/8', NAME 'gateway' \
             DEFAULT ROLE reader, writer DEFAULT DATABASE app GRANTEES ANY;"
        )
        .unwrap();
        let text = s.to_string();
        assert!(text.contains("IDENTIFIED WITH sha256_password BY 'secret'"));
        assert!(text.contains("HOST IP '10.0.0.0/8', NAME 'gateway'"));
        assert!(text.contains("DEFAULT ROLE `reader`, `writer`"));
        assert!(text.contains("DEFAULT DATABASE `app`"));
        assert!(text.contains("GRANTEES ANY"));
    }

    #[test]
    fn identified_by_shorthand() {
        let s = parse_single("CREATE USER u IDENTIFIED BY 'pw';").unwrap();
        assert!(s.to_string().contains("IDENTIFIED WITH sha256_password BY 'pw'"));
    }

    #[test]
    fn grant_variants() {
        let s = parse_single("GRANT SELECT(id, name), INSERT ON app.users TO reader WITH GRANT OPTION;")
            .unwrap();
        assert_eq!(
            s.to_string(),
            "GRANT SELECT(`id`, `name`), INSERT ON `app`.`users` TO `reader` WITH GRANT OPTION"
        );

        let s = parse_single("GRANT SELECT ON app.* TO reader;").unwrap();
        assert_eq!(s.to_string(), "GRANT SELECT ON `app`.* TO `reader`");

        let s = parse_single("GRANT ALL ON *.* TO admin;").unwrap();
        assert_eq!(s.to_string(), "GRANT ALL ON *.* TO `admin`");
    }

    #[test]
    fn revoke_statement() {
        let s = parse_single("REVOKE SELECT ON app.users FROM reader;").unwrap();
        assert_eq!(s.to_string(), "REVOKE SELECT ON `app`.`users` FROM `reader`");
    }
}
