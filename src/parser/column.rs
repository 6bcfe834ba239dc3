//! Column definitions and the other table body elements.

use crate::ast::{Codec, CodecSpec, Column, ColumnDefault, DefaultKind, Projection,
                 TableConstraint, TableIndex};
use crate::error::Result;

use super::{Parser, expr::parse_expr, types::parse_data_type};

/// Parse one column definition: name, type, then the attribute tail in any
/// order (stored canonically).
pub fn parse_column(p: &mut Parser) -> Result<Column> {
    // Dotted names are the flattened spelling of Nested columns.
    let mut name = p.parse_ident()?;
    while p.try_punct('.') {
        name.push('.');
        name.push_str(&p.parse_ident()?);
    }
    let data_type = parse_data_type(p)?;
    let mut column = Column::new(name, data_type);

    loop {
        if let Some(kind) = try_default_kind(p) {
            let expr = if kind == DefaultKind::Ephemeral && !starts_expression(p) {
                None
            } else {
                Some(parse_expr(p)?)
            };
            column.default = Some(ColumnDefault { kind, expr });
        } else if p.try_keyword("CODEC") {
            p.expect_punct('(')?;
            column.codec = Some(parse_codec_specs(p)?);
            p.expect_punct(')')?;
        } else if p.try_keyword("TTL") {
            column.ttl = Some(parse_expr(p)?);
        } else if p.try_keyword("COMMENT") {
            column.comment = Some(p.parse_string()?);
        } else {
            break;
        }
    }
    Ok(column)
}

fn try_default_kind(p: &mut Parser) -> Option<DefaultKind> {
    if p.try_keyword("DEFAULT") {
        Some(DefaultKind::Default)
    } else if p.try_keyword("MATERIALIZED") {
        Some(DefaultKind::Materialized)
    } else if p.try_keyword("EPHEMERAL") {
        Some(DefaultKind::Ephemeral)
    } else if p.try_keyword("ALIAS") {
        Some(DefaultKind::Alias)
    } else {
        None
    }
}

/// True when the cursor can begin an expression rather than the next column
/// attribute or the end of the column.
fn starts_expression(p: &mut Parser) -> bool {
    let Some(token) = p.peek() else {
        return false;
    };
    if token.is_punct(',') || token.is_punct(')') {
        return false;
    }
    !(token.is_keyword("CODEC") || token.is_keyword("TTL") || token.is_keyword("COMMENT"))
}

fn parse_codec_specs(p: &mut Parser) -> Result<Codec> {
    let mut specs = crate::ast::column::CodecList::new();
    loop {
        let name = p.parse_ident()?;
        let params = if p.try_punct('(') {
            let params = if p.check_punct(')') {
                Vec::new()
            } else {
                super::expr::parse_expr_list(p)?
            };
            p.expect_punct(')')?;
            params
        } else {
            Vec::new()
        };
        specs.push(CodecSpec { name, params });
        if !p.try_punct(',') {
            break;
        }
    }
    Ok(Codec { specs })
}

/// `INDEX name expr TYPE type(params) GRANULARITY n`.
pub fn parse_table_index(p: &mut Parser) -> Result<TableIndex> {
    p.expect_keyword("INDEX")?;
    let name = p.parse_ident()?;
    let expr = parse_expr(p)?;
    p.expect_keyword("TYPE")?;
    let index_type = p.parse_ident()?;
    let type_params = if p.try_punct('(') {
        let params = if p.check_punct(')') {
            Vec::new()
        } else {
            super::expr::parse_expr_list(p)?
        };
        p.expect_punct(')')?;
        params
    } else {
        Vec::new()
    };
    let granularity = if p.try_keyword("GRANULARITY") {
        Some(p.parse_u64()?)
    } else {
        None
    };
    Ok(TableIndex {
        name,
        expr,
        index_type,
        type_params,
        granularity
    })
}

/// `CONSTRAINT name CHECK expr` or `CONSTRAINT name ASSUME expr`.
pub fn parse_table_constraint(p: &mut Parser) -> Result<TableConstraint> {
    p.expect_keyword("CONSTRAINT")?;
    let name = p.parse_ident()?;
    let assume = if p.try_keyword("ASSUME") {
        true
    } else {
        p.expect_keyword("CHECK")?;
        false
    };
    let expr = parse_expr(p)?;
    Ok(TableConstraint { name, assume, expr })
}

/// `PROJECTION name (SELECT ...)`.
pub fn parse_projection(p: &mut Parser) -> Result<Projection> {
    p.expect_keyword("PROJECTION")?;
    let name = p.parse_ident()?;
    p.expect_punct('(')?;
    let query = p.capture_balanced()?;
    Ok(Projection { name, query })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn column(text: &str) -> Column {
        let mut p = Parser::new(tokenize(text).unwrap());
        parse_column(&mut p).unwrap()
    }

    #[test]
    fn plain_column() {
        let c = column("id UInt64");
        assert_eq!(c.name, "id");
        assert_eq!(c.to_string(), "`id` UInt64");
    }

    #[test]
    fn full_attribute_tail() {
        let c = column("payload String DEFAULT '' CODEC(ZSTD(3)) TTL d + INTERVAL 1 DAY COMMENT 'raw'");
        assert_eq!(
            c.to_string(),
            "`payload` String DEFAULT '' CODEC(ZSTD(3)) TTL `d` + INTERVAL 1 DAY COMMENT 'raw'"
        );
    }

    #[test]
    fn attribute_order_is_canonicalized() {
        let c = column("x UInt8 COMMENT 'n' DEFAULT 1");
        assert_eq!(c.to_string(), "`x` UInt8 DEFAULT 1 COMMENT 'n'");
    }

    #[test]
    fn ephemeral_without_expression() {
        let c = column("tmp String EPHEMERAL");
        assert_eq!(c.to_string(), "`tmp` String EPHEMERAL");
        let c = column("tmp String EPHEMERAL 'seed'");
        assert_eq!(c.to_string(), "`tmp` String EPHEMERAL 'seed'");
    }

    #[test]
    fn materialized_and_alias() {
        let c = column("day Date MATERIALIZED toDate(ts)");
        assert_eq!(c.to_string(), "`day` Date MATERIALIZED toDate(`ts`)");
        let c = column("full String ALIAS concat(a, b)");
        assert_eq!(c.to_string(), "`full` String ALIAS concat(`a`, `b`)");
    }

    #[test]
    fn index_definition() {
        let mut p = Parser::new(
            tokenize("INDEX idx_u u TYPE minmax GRANULARITY 4").unwrap()
        );
        let idx = parse_table_index(&mut p).unwrap();
        assert_eq!(idx.to_string(), "INDEX `idx_u` `u` TYPE minmax GRANULARITY 4");
    }

    #[test]
    fn bloom_filter_index_params() {
        let mut p = Parser::new(
            tokenize("INDEX idx_n name TYPE bloom_filter(0.01) GRANULARITY 1").unwrap()
        );
        let idx = parse_table_index(&mut p).unwrap();
        assert_eq!(
            idx.to_string(),
            "INDEX `idx_n` `name` TYPE bloom_filter(0.01) GRANULARITY 1"
        );
    }

    #[test]
    fn constraint_definition() {
        let mut p = Parser::new(tokenize("CONSTRAINT positive CHECK amount > 0").unwrap());
        let c = parse_table_constraint(&mut p).unwrap();
        assert_eq!(c.to_string(), "CONSTRAINT `positive` CHECK `amount` > 0");
    }
}
