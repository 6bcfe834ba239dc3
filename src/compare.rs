//! Structural equality with ClickHouse canonicalization rules.
//!
//! The server's catalogs rewrite some type and parameter spellings, so a
//! byte-level comparison between authored DDL and extracted DDL would
//! produce phantom diffs. The rules here absorb exactly those rewrites:
//!
//! - `Decimal32(S)` = `Decimal(9, S)`, and the 64/128/256 analogues
//! - `DateTime(P[, tz])` = `DateTime64(P[, tz])` for numeric precision P
//! - `DateTime64(P)` = `DateTime64(P, 'tz')` when either side omits the
//!   timezone; two explicit, different timezones stay unequal
//! - quoted `'UTC'` = unquoted `UTC` in type parameters
//! - `ReplicatedMergeTree()` with empty params in the target accepts any
//!   parameterized form in current (server-assigned defaults)
//! - flattened `prefix.leaf Array(T)` columns = `prefix Nested(leaf T)`
//!
//! Sequences compare element-wise in order; SETTINGS bags compare as sets.

use crate::ast::{Column, DataType, Engine, NestedColumn, TypeParam};

/// Decimal shorthand widths: DecimalN(S) is Decimal(width, S).
fn decimal_width(name: &str) -> Option<&'static str> {
    match name {
        "Decimal32" => Some("9"),
        "Decimal64" => Some("18"),
        "Decimal128" => Some("38"),
        "Decimal256" => Some("76"),
        _ => None
    }
}

/// Rewrite DecimalN(S) to Decimal(width, S). Other types pass through.
fn normalize_simple(name: &str, params: &[TypeParam]) -> (String, Vec<TypeParam>) {
    if let Some(width) = decimal_width(name) {
        if params.len() == 1 {
            return (
                "Decimal".to_string(),
                vec![TypeParam::Number(width.to_string()), params[0].clone()]
            );
        }
    }
    // DateTime with a numeric precision is the catalog spelling of
    // DateTime64.
    if name == "DateTime"
        && params
            .first()
            .is_some_and(|p| matches!(p, TypeParam::Number(_)))
    {
        return ("DateTime64".to_string(), params.to_vec());
    }
    (name.to_string(), params.to_vec())
}

/// Single type parameter equality with quote tolerance.
fn type_params_match(a: &TypeParam, b: &TypeParam) -> bool {
    match (a, b) {
        (TypeParam::String(x), TypeParam::Ident(y)) => x == y.as_str(),
        (TypeParam::Ident(x), TypeParam::String(y)) => x.as_str() == y,
        (
            TypeParam::Function {
                name: an,
                params: ap
            },
            TypeParam::Function {
                name: bn,
                params: bp
            }
        ) => an == bn && params_equal(ap, bp),
        _ => a == b
    }
}

/// Parameter list equality, element-wise with quote tolerance.
pub fn params_equal(a: &[TypeParam], b: &[TypeParam]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| type_params_match(x, y))
}

/// Structural data type equality under the canonicalization rules.
pub fn data_types_equal(a: &DataType, b: &DataType) -> bool {
    match (a, b) {
        (
            DataType::Simple {
                name: an,
                params: ap
            },
            DataType::Simple {
                name: bn,
                params: bp
            }
        ) => {
            let (an, ap) = normalize_simple(an, ap);
            let (bn, bp) = normalize_simple(bn, bp);
            if an != bn {
                return false;
            }
            if an == "DateTime64" && ap.len() != bp.len() {
                // Timezone tolerance: precision must agree, a missing
                // timezone on either side is accepted.
                let (short, long) = if ap.len() < bp.len() {
                    (&ap, &bp)
                } else {
                    (&bp, &ap)
                };
                return short.len() == 1 && long.len() == 2 && type_params_match(&short[0], &long[0]);
            }
            params_equal(&ap, &bp)
        }
        (DataType::Nullable(x), DataType::Nullable(y)) => data_types_equal(x, y),
        (DataType::Array(x), DataType::Array(y)) => data_types_equal(x, y),
        (DataType::LowCardinality(x), DataType::LowCardinality(y)) => data_types_equal(x, y),
        (DataType::Map(ak, av), DataType::Map(bk, bv)) => {
            data_types_equal(ak, bk) && data_types_equal(av, bv)
        }
        (DataType::Tuple(xs), DataType::Tuple(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| x.name == y.name && data_types_equal(&x.data_type, &y.data_type))
        }
        (DataType::Nested(xs), DataType::Nested(ys)) => nested_columns_equal(xs, ys),
        _ => false
    }
}

fn nested_columns_equal(a: &[NestedColumn], b: &[NestedColumn]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.name == y.name && data_types_equal(&x.data_type, &y.data_type))
}

/// Engine equality as seen by the differ: `current` is what the server
/// reports, `target` is what the author wrote. An empty parameter list on a
/// Replicated target engine opts into server-assigned path defaults.
pub fn engines_equal(current: &Engine, target: &Engine) -> bool {
    if current.name != target.name {
        return false;
    }
    if target.params.is_empty() && target.name.starts_with("Replicated") {
        return true;
    }
    current.params == target.params
}

/// Column equality: type under normalization rules, everything else exact.
pub fn columns_equal(a: &Column, b: &Column) -> bool {
    a.name == b.name
        && data_types_equal(&a.data_type, &b.data_type)
        && a.default == b.default
        && a.codec == b.codec
        && a.ttl == b.ttl
        && a.comment == b.comment
}

/// Re-group flattened `prefix.leaf Array(T)` columns into
/// `prefix Nested(leaf T, ...)`. Columns that do not participate pass
/// through in position; a re-grouped Nested column takes the position of
/// its first leaf. Used for equality only; the plan renderer emits
/// whichever form the target used.
pub fn regroup_nested(columns: &[Column]) -> Vec<Column> {
    let mut out: Vec<Column> = Vec::with_capacity(columns.len());
    // Index into `out` for each open Nested group, by prefix.
    let mut groups: Vec<(String, usize)> = Vec::new();

    for column in columns {
        let flattened = column.name.split_once('.').and_then(|(prefix, leaf)| {
            if let DataType::Array(inner) = &column.data_type {
                Some((prefix.to_string(), leaf.to_string(), (**inner).clone()))
            } else {
                None
            }
        });
        match flattened {
            Some((prefix, leaf, inner)) => {
                let nested = NestedColumn {
                    name:      leaf.into(),
                    data_type: inner
                };
                if let Some((_, at)) = groups.iter().find(|(p, _)| *p == prefix) {
                    if let DataType::Nested(cols) = &mut out[*at].data_type {
                        cols.push(nested);
                    }
                } else {
                    let mut grouped = Column::new(prefix.clone(), DataType::Nested(vec![nested]));
                    grouped.comment = column.comment.clone();
                    groups.push((prefix, out.len()));
                    out.push(grouped);
                }
            }
            None => out.push(column.clone())
        }
    }
    out
}

/// Column sequences equal after Nested re-grouping on both sides.
pub fn column_lists_equal(a: &[Column], b: &[Column]) -> bool {
    let a = regroup_nested(a);
    let b = regroup_nested(b);
    a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| columns_equal(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::{Parser, types::parse_data_type};

    fn data_type(text: &str) -> DataType {
        let mut p = Parser::new(tokenize(text).unwrap());
        parse_data_type(&mut p).unwrap()
    }

    fn column(text: &str) -> Column {
        let mut p = Parser::new(tokenize(text).unwrap());
        crate::parser::column::parse_column(&mut p).unwrap()
    }

    #[test]
    fn decimal_aliases() {
        assert!(data_types_equal(&data_type("Decimal32(2)"), &data_type("Decimal(9, 2)")));
        assert!(data_types_equal(&data_type("Decimal64(4)"), &data_type("Decimal(18, 4)")));
        assert!(data_types_equal(&data_type("Decimal128(6)"), &data_type("Decimal(38, 6)")));
        assert!(data_types_equal(&data_type("Decimal256(8)"), &data_type("Decimal(76, 8)")));
        assert!(!data_types_equal(&data_type("Decimal32(2)"), &data_type("Decimal(18, 2)")));
    }

    #[test]
    fn datetime_timezone_tolerance() {
        assert!(data_types_equal(
            &data_type("DateTime64(3, 'UTC')"),
            &data_type("DateTime64(3)")
        ));
        assert!(data_types_equal(
            &data_type("DateTime64(3)"),
            &data_type("DateTime64(3, 'UTC')")
        ));
        assert!(!data_types_equal(
            &data_type("DateTime64(3, 'UTC')"),
            &data_type("DateTime64(3, 'EST')")
        ));
        assert!(!data_types_equal(&data_type("DateTime64(3)"), &data_type("DateTime64(6)")));
    }

    #[test]
    fn datetime_precision_is_datetime64() {
        assert!(data_types_equal(
            &data_type("DateTime(3, 'UTC')"),
            &data_type("DateTime64(3, 'UTC')")
        ));
        assert!(data_types_equal(&data_type("DateTime(3)"), &data_type("DateTime64(3)")));
        // Plain DateTime is its own type.
        assert!(!data_types_equal(&data_type("DateTime"), &data_type("DateTime64(3)")));
        assert!(data_types_equal(
            &data_type("DateTime('UTC')"),
            &data_type("DateTime(UTC)")
        ));
    }

    #[test]
    fn quoted_and_unquoted_params() {
        assert!(data_types_equal(
            &data_type("DateTime64(3, UTC)"),
            &data_type("DateTime64(3, 'UTC')")
        ));
    }

    #[test]
    fn containers_recurse() {
        assert!(data_types_equal(
            &data_type("Array(Decimal32(2))"),
            &data_type("Array(Decimal(9, 2))")
        ));
        assert!(data_types_equal(
            &data_type("Map(String, DateTime64(3))"),
            &data_type("Map(String, DateTime64(3, 'UTC'))")
        ));
        assert!(!data_types_equal(
            &data_type("Array(String)"),
            &data_type("Nullable(String)")
        ));
    }

    #[test]
    fn replicated_engine_defaults() {
        let current = Engine {
            name:   "ReplicatedMergeTree".into(),
            params: vec![
                crate::ast::Expr::string("/clickhouse/tables/{shard}/t"),
                crate::ast::Expr::string("{replica}"),
            ]
        };
        let target = Engine::named("ReplicatedMergeTree");
        assert!(engines_equal(&current, &target));
        // The opt-in runs one way only.
        assert!(!engines_equal(&target, &current));
        assert!(!engines_equal(&current, &Engine::named("MergeTree")));
    }

    #[test]
    fn nested_regrouping() {
        let flattened = vec![
            column("id UInt64"),
            column("profile.name Array(String)"),
            column("profile.age Array(UInt8)"),
        ];
        let grouped = vec![
            column("id UInt64"),
            column("profile Nested(name String, age UInt8)"),
        ];
        assert!(column_lists_equal(&flattened, &grouped));
        assert!(column_lists_equal(&grouped, &flattened));

        let different = vec![
            column("id UInt64"),
            column("profile Nested(name String, age UInt64)"),
        ];
        assert!(!column_lists_equal(&flattened, &different));
    }
}
