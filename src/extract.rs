//! Live-server schema extraction.
//!
//! Reads the server's system catalogs and `SHOW CREATE` output into a
//! statement stream through the crate's own parser, so the differ compares
//! two trees of the same shape.
//!
//! When the project configures a cluster, extracted CREATE statements get
//! `ON CLUSTER` injected: the server catalogs do not record the clause, and
//! without the injection every clustered object would diff as a cluster
//! transition. The `inject_cluster` switch turns this off. The
//! `housekeeper` bookkeeping namespace is never extracted and never
//! injected.

use tracing::debug;

use crate::ast::{Ident, Statement};
use crate::client::ClickHouseExec;
use crate::error::Result;
use crate::parser::parse_single;

/// Databases that are never part of a managed schema.
const SKIPPED_DATABASES: &[&str] =
    &["system", "information_schema", "INFORMATION_SCHEMA", "housekeeper", "default"];

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub cluster:        Option<String>,
    pub inject_cluster: bool
}

fn skipped_list() -> String {
    SKIPPED_DATABASES
        .iter()
        .map(|db| format!("'{}'", db))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extract the full managed schema from a live server.
pub async fn extract_schema<C: ClickHouseExec>(
    client: &C,
    options: &ExtractOptions
) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();

    for row in client
        .query(&format!(
            "SELECT name FROM system.databases WHERE name NOT IN ({}) ORDER BY name",
            skipped_list()
        ))
        .await?
    {
        let show = client
            .query(&format!("SHOW CREATE DATABASE `{}`", row[0]))
            .await?;
        push_parsed(&mut statements, show, options)?;
    }

    for row in client
        .query(&format!(
            "SELECT database, name FROM system.tables \
             WHERE database NOT IN ({}) AND is_temporary = 0 \
             AND engine NOT IN ('View', 'MaterializedView', 'Dictionary') \
             AND name NOT LIKE '.inner%' \
             ORDER BY database, name",
            skipped_list()
        ))
        .await?
    {
        let show = client
            .query(&format!("SHOW CREATE TABLE `{}`.`{}`", row[0], row[1]))
            .await?;
        push_parsed(&mut statements, show, options)?;
    }

    for row in client
        .query(&format!(
            "SELECT database, name FROM system.dictionaries \
             WHERE database NOT IN ({}) ORDER BY database, name",
            skipped_list()
        ))
        .await?
    {
        let show = client
            .query(&format!("SHOW CREATE DICTIONARY `{}`.`{}`", row[0], row[1]))
            .await?;
        push_parsed(&mut statements, show, options)?;
    }

    for row in client
        .query(&format!(
            "SELECT database, name FROM system.tables \
             WHERE database NOT IN ({}) AND engine IN ('View', 'MaterializedView') \
             AND name NOT LIKE '.inner%' \
             ORDER BY database, name",
            skipped_list()
        ))
        .await?
    {
        let show = client
            .query(&format!("SHOW CREATE TABLE `{}`.`{}`", row[0], row[1]))
            .await?;
        push_parsed(&mut statements, show, options)?;
    }

    let mut grantees: Vec<String> = Vec::new();

    for row in client
        .query("SELECT name FROM system.roles ORDER BY name")
        .await?
    {
        let show = client.query(&format!("SHOW CREATE ROLE `{}`", row[0])).await?;
        push_parsed(&mut statements, show, options)?;
        grantees.push(row[0].clone());
    }

    for row in client
        .query("SELECT name FROM system.users WHERE name != 'default' ORDER BY name")
        .await?
    {
        let show = client.query(&format!("SHOW CREATE USER `{}`", row[0])).await?;
        push_parsed(&mut statements, show, options)?;
        grantees.push(row[0].clone());
    }

    for grantee in grantees {
        for row in client
            .query(&format!("SHOW GRANTS FOR `{}`", grantee))
            .await?
        {
            push_parsed(&mut statements, vec![row], options)?;
        }
    }

    for row in client
        .query("SELECT name FROM system.functions WHERE origin = 'SQLUserDefined' ORDER BY name")
        .await?
    {
        let show = client
            .query(&format!("SHOW CREATE FUNCTION `{}`", row[0]))
            .await?;
        push_parsed(&mut statements, show, options)?;
    }

    for row in client
        .query("SELECT name FROM system.named_collections ORDER BY name")
        .await?
    {
        let show = client
            .query(&format!("SHOW CREATE NAMED COLLECTION `{}`", row[0]))
            .await?;
        push_parsed(&mut statements, show, options)?;
    }

    debug!(count = statements.len(), "extracted schema statements");
    Ok(statements)
}

fn push_parsed(
    statements: &mut Vec<Statement>,
    show_rows: Vec<Vec<String>>,
    options: &ExtractOptions
) -> Result<()> {
    let Some(row) = show_rows.into_iter().next() else {
        return Ok(());
    };
    let Some(ddl) = row.into_iter().next() else {
        return Ok(());
    };
    if ddl.trim().is_empty() {
        return Ok(());
    }
    let mut statement = parse_single(ddl.trim())?;
    if options.inject_cluster {
        if let Some(cluster) = &options.cluster {
            inject_cluster(&mut statement, cluster.as_str().into());
        }
    }
    statements.push(statement);
    Ok(())
}

/// Add `ON CLUSTER` to an extracted statement that lacks one.
fn inject_cluster(statement: &mut Statement, cluster: Ident) {
    let slot = match statement {
        Statement::CreateDatabase(s) => &mut s.cluster,
        Statement::CreateTable(s) => &mut s.cluster,
        Statement::CreateDictionary(s) => &mut s.cluster,
        Statement::CreateView(s) => &mut s.cluster,
        Statement::CreateNamedCollection(s) => &mut s.cluster,
        Statement::CreateRole(s) => &mut s.cluster,
        Statement::CreateUser(s) => &mut s.cluster,
        Statement::CreateFunction(s) => &mut s.cluster,
        Statement::Grant(s) => &mut s.cluster,
        _ => return
    };
    if slot.is_none() {
        *slot = Some(cluster);
    }
}
