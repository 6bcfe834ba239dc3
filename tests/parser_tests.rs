//! Parser behavior beyond the unit tests: multi-statement streams, error
//! positions, and the preprocessor interaction.

use housekeeper::ast::{Commented as _, Statement};
use housekeeper::compiler::compile_text;
use housekeeper::error::Error;
use housekeeper::parser::parse_statements;

#[test]
fn test_multi_statement_stream() {
    let sql = "CREATE DATABASE app;\n\n\
               -- the main table\n\
               CREATE TABLE app.users (id UInt64) ENGINE = MergeTree() ORDER BY id;\n\
               GRANT SELECT ON app.users TO reader;\n";
    let statements = parse_statements(sql).unwrap();
    assert_eq!(statements.len(), 3);
    assert!(matches!(statements[0], Statement::CreateDatabase(_)));
    assert!(matches!(statements[1], Statement::CreateTable(_)));
    assert!(matches!(statements[2], Statement::Grant(_)));
    assert_eq!(
        statements[1].commented().leading_comments(),
        ["the main table"]
    );
}

#[test]
fn test_parse_error_carries_position() {
    let err = parse_statements("CREATE DATABASE app;\nCREATE WIDGET nope;").unwrap_err();
    match err {
        Error::Parse { location, message, .. } => {
            assert_eq!(location.line, 2);
            assert!(message.contains("expected"));
        }
        other => panic!("expected parse error, got {other}")
    }
}

#[test]
fn test_parse_error_lists_expected_set() {
    let err = parse_statements("CREATE TABLE t (id UInt64);").unwrap_err();
    // A table without ENGINE is rejected with the expected token named.
    assert!(err.to_string().contains("ENGINE"));
}

#[test]
fn test_unterminated_string_position() {
    let err = parse_statements("CREATE DATABASE app COMMENT 'oops;").unwrap_err();
    match err {
        Error::Parse { location, .. } => assert_eq!(location.line, 1),
        other => panic!("expected parse error, got {other}")
    }
}

#[test]
fn test_implicit_aliases_are_normalized_in_view_bodies() {
    let statements =
        compile_text("CREATE VIEW v AS SELECT u.id FROM app.users u JOIN app.orders o ON u.id = o.uid;")
            .unwrap();
    let Statement::CreateView(view) = &statements[0] else {
        panic!("expected a view");
    };
    assert!(view.query.contains("FROM app.users AS u"));
    assert!(view.query.contains("JOIN app.orders AS o"));
}

#[test]
fn test_keywords_are_case_insensitive() {
    let a = parse_statements("create table t (id UInt64) engine = MergeTree() order by id;")
        .unwrap();
    let b = parse_statements("CREATE TABLE t (id UInt64) ENGINE = MergeTree() ORDER BY id;")
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_identifier_case_is_significant() {
    let a = parse_statements("CREATE TABLE Events (id UInt64) ENGINE = Log();").unwrap();
    let b = parse_statements("CREATE TABLE events (id UInt64) ENGINE = Log();").unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_backticked_keyword_is_not_a_keyword() {
    // `TABLE` as an identifier must not confuse the dispatcher.
    let statements = parse_statements("CREATE TABLE `table` (`order` UInt8) ENGINE = Log();")
        .unwrap();
    let Statement::CreateTable(table) = &statements[0] else {
        panic!("expected a table");
    };
    assert_eq!(table.name.name, "table");
    assert_eq!(table.columns[0].name, "order");
}

#[test]
fn test_four_token_lookahead_paths() {
    // These statement heads need several tokens before the rule is known.
    parse_statements("CREATE OR REPLACE MATERIALIZED VIEW mv TO d.t AS SELECT 1;").unwrap();
    parse_statements("CREATE NAMED COLLECTION IF NOT EXISTS c AS k = 1;").unwrap();
    parse_statements("ALTER NAMED COLLECTION c DELETE k;").unwrap();
    parse_statements("DROP NAMED COLLECTION IF EXISTS c;").unwrap();
}
