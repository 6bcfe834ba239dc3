//! `CREATE TABLE` and `CREATE NAMED COLLECTION` rules.

use crate::ast::{CollectionParam, CreateNamedCollection, CreateTable, Engine, QualifiedName,
                 Settings, Statement};
use crate::error::Result;

use super::{Parser,
            column::{parse_column, parse_projection, parse_table_constraint, parse_table_index},
            expr::{parse_expr, parse_expr_list}};

/// Engine reference: `Name` or `Name(args...)`.
pub fn parse_engine(p: &mut Parser) -> Result<Engine> {
    let name = p.parse_ident()?;
    let params = if p.try_punct('(') {
        let params = if p.check_punct(')') {
            Vec::new()
        } else {
            parse_expr_list(p)?
        };
        p.expect_punct(')')?;
        params
    } else {
        Vec::new()
    };
    Ok(Engine { name, params })
}

/// `SETTINGS key = value, ...` body (after the keyword).
pub fn parse_settings_list(p: &mut Parser) -> Result<Settings> {
    let mut settings = Settings::default();
    loop {
        let key = p.parse_ident()?;
        p.expect_punct('=')?;
        let value = parse_expr(p)?;
        settings.insert(key, value);
        if !p.try_punct(',') {
            break;
        }
    }
    Ok(settings)
}

pub fn parse_create_table(p: &mut Parser, or_replace: bool) -> Result<Statement> {
    p.expect_keyword("TABLE")?;
    let if_not_exists = p.try_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_qualified_name()?;
    let cluster = p.parse_on_cluster()?;

    let mut table = CreateTable::new(name, Engine::named(""));
    table.or_replace = or_replace;
    table.if_not_exists = if_not_exists;
    table.cluster = cluster;

    p.expect_punct('(')?;
    if !p.check_punct(')') {
        loop {
            if p.check_keyword("INDEX") {
                table.indexes.push(parse_table_index(p)?);
            } else if p.check_keyword("CONSTRAINT") {
                table.constraints.push(parse_table_constraint(p)?);
            } else if p.check_keyword("PROJECTION") {
                table.projections.push(parse_projection(p)?);
            } else {
                table.columns.push(parse_column(p)?);
            }
            if !p.try_punct(',') {
                break;
            }
        }
    }
    p.expect_punct(')')?;

    p.expect_keyword("ENGINE")?;
    p.expect_punct('=')?;
    table.engine = parse_engine(p)?;

    // Trailing clauses are accepted in any order and stored canonically.
    loop {
        if p.try_keywords(&["PARTITION", "BY"]) {
            table.partition_by = Some(parse_expr(p)?);
        } else if p.try_keywords(&["PRIMARY", "KEY"]) {
            table.primary_key = Some(parse_expr(p)?);
        } else if p.try_keywords(&["ORDER", "BY"]) {
            table.order_by = Some(parse_expr(p)?);
        } else if p.try_keywords(&["SAMPLE", "BY"]) {
            table.sample_by = Some(parse_expr(p)?);
        } else if p.try_keyword("TTL") {
            table.ttl = Some(parse_expr(p)?);
        } else if p.try_keyword("SETTINGS") {
            table.settings = parse_settings_list(p)?;
        } else if p.try_keyword("COMMENT") {
            table.comment = Some(p.parse_string()?);
        } else {
            break;
        }
    }

    Ok(Statement::CreateTable(table))
}

pub fn parse_create_named_collection(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("NAMED")?;
    p.expect_keyword("COLLECTION")?;
    let if_not_exists = p.try_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    p.expect_keyword("AS")?;

    let mut params = Vec::new();
    loop {
        params.push(parse_collection_param(p)?);
        if !p.try_punct(',') {
            break;
        }
    }
    let comment = p.parse_opt_comment()?;

    Ok(Statement::CreateNamedCollection(CreateNamedCollection {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        if_not_exists,
        name,
        cluster,
        params,
        comment
    }))
}

/// `key = value [OVERRIDABLE | NOT OVERRIDABLE]`.
pub fn parse_collection_param(p: &mut Parser) -> Result<CollectionParam> {
    let key = p.parse_ident()?;
    p.expect_punct('=')?;
    let value = parse_expr(p)?;
    let overridable = if p.try_keyword("OVERRIDABLE") {
        Some(true)
    } else if p.try_keywords(&["NOT", "OVERRIDABLE"]) {
        Some(false)
    } else {
        None
    };
    Ok(CollectionParam {
        key,
        value,
        overridable
    })
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_single;

    #[test]
    fn merge_tree_table() {
        let s = parse_single(
            "CREATE TABLE app.users (id UInt64, name String) ENGINE = MergeTree() ORDER BY id;"
        )
        .unwrap();
        let text = s.to_string();
        assert!(text.contains("`app`.`users`"));
        assert!(text.contains("`id` UInt64,\n    `name` String"));
        assert!(text.ends_with("ORDER BY `id`"));
    }

    #[test]
    fn clause_order_is_canonicalized() {
        let s = parse_single(
            "CREATE TABLE t (d Date) ENGINE = MergeTree() ORDER BY d PARTITION BY toYYYYMM(d) \
             SETTINGS index_granularity = 8192 TTL d + INTERVAL 90 DAY;"
        )
        .unwrap();
        let text = s.to_string();
        let partition = text.find("PARTITION BY").unwrap();
        let order = text.find("ORDER BY").unwrap();
        let ttl = text.find("\nTTL").unwrap();
        let settings = text.find("SETTINGS").unwrap();
        assert!(partition < order && order < ttl && ttl < settings);
    }

    #[test]
    fn replicated_engine_params() {
        let s = parse_single(
            "CREATE TABLE t ON CLUSTER main (id UInt64) \
             ENGINE = ReplicatedMergeTree('/clickhouse/tables/{shard}/t', '{replica}') ORDER BY id;"
        )
        .unwrap();
        assert!(
            s.to_string()
                .contains("ReplicatedMergeTree('/clickhouse/tables/{shard}/t', '{replica}')")
        );
    }

    #[test]
    fn body_elements_mix() {
        let s = parse_single(
            "CREATE TABLE t (\
                id UInt64,\
                INDEX idx_id id TYPE minmax GRANULARITY 1,\
                CONSTRAINT c CHECK id > 0,\
                PROJECTION by_id (SELECT id ORDER BY id)\
             ) ENGINE = MergeTree() ORDER BY id;"
        )
        .unwrap();
        let text = s.to_string();
        assert!(text.contains("INDEX `idx_id`"));
        assert!(text.contains("CONSTRAINT `c` CHECK"));
        assert!(text.contains("PROJECTION `by_id` (SELECT id ORDER BY id)"));
    }

    #[test]
    fn named_collection() {
        let s = parse_single(
            "CREATE NAMED COLLECTION s3_creds AS \
             access_key_id = 'AKIA' OVERRIDABLE, url = 'https://bucket' NOT OVERRIDABLE;"
        )
        .unwrap();
        let text = s.to_string();
        assert!(text.contains("access_key_id = 'AKIA' OVERRIDABLE"));
        assert!(text.contains("url = 'https://bucket' NOT OVERRIDABLE"));
    }
}
