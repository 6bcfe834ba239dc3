//! `CREATE [MATERIALIZED] VIEW` rule.

use crate::ast::{CreateView, Statement};
use crate::error::Result;

use super::{Parser,
            expr::parse_expr,
            table::{parse_engine, parse_settings_list}};

pub fn parse_create_view(p: &mut Parser, or_replace: bool) -> Result<Statement> {
    let materialized = p.try_keyword("MATERIALIZED");
    p.expect_keyword("VIEW")?;
    let if_not_exists = p.try_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_qualified_name()?;

    let mut view = CreateView::new(name, String::new());
    view.or_replace = or_replace;
    view.materialized = materialized;
    view.if_not_exists = if_not_exists;
    view.cluster = p.parse_on_cluster()?;

    if p.try_keyword("TO") {
        view.to = Some(p.parse_qualified_name()?);
    }

    loop {
        if p.try_keyword("ENGINE") {
            p.expect_punct('=')?;
            view.engine = Some(parse_engine(p)?);
        } else if p.try_keywords(&["PARTITION", "BY"]) {
            view.partition_by = Some(parse_expr(p)?);
        } else if p.try_keywords(&["ORDER", "BY"]) {
            view.order_by = Some(parse_expr(p)?);
        } else if p.try_keyword("SETTINGS") {
            view.settings = parse_settings_list(p)?;
        } else if p.try_keyword("POPULATE") {
            view.populate = true;
        } else {
            break;
        }
    }

    p.expect_keyword("AS")?;
    view.query = p.capture_until_semicolon();
    if view.query.is_empty() {
        return Err(p.expected("a SELECT body"));
    }
    Ok(Statement::CreateView(view))
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_single;

    #[test]
    fn plain_view() {
        let s = parse_single("CREATE VIEW v AS SELECT a, b FROM t;").unwrap();
        assert_eq!(s.to_string(), "CREATE VIEW `v`\nAS SELECT a, b FROM t");
    }

    #[test]
    fn materialized_with_target() {
        let s = parse_single(
            "CREATE MATERIALIZED VIEW mv ON CLUSTER main TO dst.events AS \
             SELECT id, count() AS n FROM src.events GROUP BY id;"
        )
        .unwrap();
        let text = s.to_string();
        assert!(text.starts_with("CREATE MATERIALIZED VIEW `mv` ON CLUSTER `main` TO `dst`.`events`"));
        assert!(text.contains("AS SELECT id, count() AS n FROM src.events GROUP BY id"));
    }

    #[test]
    fn materialized_with_inner_engine() {
        let s = parse_single(
            "CREATE MATERIALIZED VIEW mv ENGINE = SummingMergeTree() ORDER BY d POPULATE AS \
             SELECT d, sum(v) AS v FROM t GROUP BY d;"
        )
        .unwrap();
        let text = s.to_string();
        assert!(text.contains("ENGINE = SummingMergeTree()"));
        assert!(text.contains("ORDER BY `d`"));
        assert!(text.contains("POPULATE"));
    }

    #[test]
    fn view_body_is_canonical_tokens() {
        let a = parse_single("CREATE VIEW v AS SELECT   a,b\n FROM   t;").unwrap();
        let b = parse_single("CREATE VIEW v AS SELECT a, b FROM t;").unwrap();
        assert_eq!(a, b);
    }
}
