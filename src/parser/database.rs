//! `CREATE DATABASE` rule.

use crate::ast::{CreateDatabase, Engine, Statement};
use crate::error::Result;

use super::{Parser, table::parse_engine};

pub fn parse_create_database(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("DATABASE")?;
    let if_not_exists = p.try_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    let engine: Option<Engine> = if p.try_keyword("ENGINE") {
        p.expect_punct('=')?;
        Some(parse_engine(p)?)
    } else {
        None
    };
    let comment = p.parse_opt_comment()?;
    Ok(Statement::CreateDatabase(CreateDatabase {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        if_not_exists,
        name,
        cluster,
        engine,
        comment
    }))
}
