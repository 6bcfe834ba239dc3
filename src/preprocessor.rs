//! Syntactic input normalization applied before lexing.
//!
//! ClickHouse accepts implicit table aliases (`FROM users u`) inside SELECT
//! bodies. The canonical formatter always emits the explicit `AS` form, so
//! the two spellings would defeat byte-level body comparison. This pass
//! rewrites the implicit form to `AS` up front; everything else passes
//! through untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches `FROM|JOIN <table-ref> <bare-alias>` where the alias candidate is
/// a bare identifier. Keyword candidates are filtered in the replacement
/// callback because the regex engine has no look-ahead.
static IMPLICIT_ALIAS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(FROM|JOIN)\s+([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)\s+([A-Za-z_][A-Za-z0-9_]*)")
        .expect("valid regex")
});

/// Words that legally follow a table reference and therefore are never an
/// implicit alias.
const NON_ALIAS_WORDS: &[&str] = &[
    "AS", "ON", "USING", "WHERE", "GROUP", "ORDER", "HAVING", "LIMIT", "SETTINGS", "UNION",
    "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "ANY", "ALL", "ASOF", "SEMI", "ANTI",
    "GLOBAL", "ARRAY", "PREWHERE", "SAMPLE", "FINAL", "WITH", "WINDOW", "QUALIFY", "FORMAT",
    "SELECT", "INTERVAL", "AND", "OR", "NOT", "IN", "BETWEEN", "LIKE", "IS", "THEN", "ELSE",
    "END", "WHEN", "CASE", "TO"
];

fn is_alias_candidate(word: &str) -> bool {
    !NON_ALIAS_WORDS.iter().any(|kw| word.eq_ignore_ascii_case(kw))
}

/// Normalize implicit table aliases to explicit `AS` form.
///
/// String literals and comments are left untouched; the rewrite only sees
/// code spans.
pub fn normalize_aliases(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut code = String::new();
    let bytes = sql.as_bytes();
    let mut i = 0;

    let mut flush = |code: &mut String, out: &mut String| {
        if !code.is_empty() {
            out.push_str(&rewrite_code_span(code));
            code.clear();
        }
    };

    while i < bytes.len() {
        let ch = bytes[i] as char;
        if ch == '\'' {
            flush(&mut code, &mut out);
            out.push(ch);
            i += 1;
            while i < bytes.len() {
                let c = bytes[i] as char;
                out.push(c);
                i += 1;
                if c == '\\' && i < bytes.len() {
                    out.push(bytes[i] as char);
                    i += 1;
                } else if c == '\'' {
                    break;
                }
            }
        } else if ch == '`' {
            flush(&mut code, &mut out);
            out.push(ch);
            i += 1;
            while i < bytes.len() {
                let c = bytes[i] as char;
                out.push(c);
                i += 1;
                if c == '`' {
                    break;
                }
            }
        } else if ch == '-' && i + 1 < bytes.len() && bytes[i + 1] as char == '-' {
            flush(&mut code, &mut out);
            while i < bytes.len() && bytes[i] as char != '\n' {
                out.push(bytes[i] as char);
                i += 1;
            }
        } else if ch == '/' && i + 1 < bytes.len() && bytes[i + 1] as char == '*' {
            flush(&mut code, &mut out);
            out.push_str("/*");
            i += 2;
            while i < bytes.len() {
                if bytes[i] as char == '*' && i + 1 < bytes.len() && bytes[i + 1] as char == '/' {
                    out.push_str("*/");
                    i += 2;
                    break;
                }
                out.push(bytes[i] as char);
                i += 1;
            }
        } else {
            code.push(ch);
            i += 1;
        }
    }
    flush(&mut code, &mut out);
    out
}

fn rewrite_code_span(code: &str) -> String {
    IMPLICIT_ALIAS_REGEX
        .replace_all(code, |caps: &Captures<'_>| {
            let keyword = &caps[1];
            let table = &caps[2];
            let alias = &caps[3];
            if is_alias_candidate(alias) {
                format!("{} {} AS {}", keyword, table, alias)
            } else {
                caps[0].to_string()
            }
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_implicit_alias() {
        assert_eq!(
            normalize_aliases("SELECT u.id FROM users u"),
            "SELECT u.id FROM users AS u"
        );
        assert_eq!(
            normalize_aliases("SELECT * FROM app.users u JOIN app.orders o ON u.id = o.uid"),
            "SELECT * FROM app.users AS u JOIN app.orders AS o ON u.id = o.uid"
        );
    }

    #[test]
    fn leaves_explicit_alias_alone() {
        let sql = "SELECT * FROM users AS u";
        assert_eq!(normalize_aliases(sql), sql);
    }

    #[test]
    fn keywords_are_not_aliases() {
        let sql = "SELECT * FROM users WHERE id = 1";
        assert_eq!(normalize_aliases(sql), sql);
        let sql = "SELECT * FROM a JOIN b ON a.id = b.id";
        assert_eq!(normalize_aliases(sql), sql);
        let sql = "SELECT * FROM events ORDER BY id";
        assert_eq!(normalize_aliases(sql), sql);
    }

    #[test]
    fn ddl_text_passes_through() {
        let sql = "CREATE TABLE users (id UInt64) ENGINE = MergeTree() ORDER BY id";
        assert_eq!(normalize_aliases(sql), sql);
    }

    #[test]
    fn strings_and_comments_are_untouched() {
        let sql = "CREATE TABLE t (c String COMMENT 'derived from events stream') ENGINE = Log()";
        assert_eq!(normalize_aliases(sql), sql);
        let sql = "-- data from users table\nSELECT 1";
        assert_eq!(normalize_aliases(sql), sql);
        let sql = "/* from a b */ SELECT 1";
        assert_eq!(normalize_aliases(sql), sql);
    }

    #[test]
    fn backtick_identifiers_are_untouched() {
        let sql = "SELECT * FROM `from` WHERE x = 1";
        assert_eq!(normalize_aliases(sql), sql);
    }
}
