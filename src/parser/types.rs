//! Data type grammar.

use crate::ast::{DataType, NestedColumn, TupleElement, TypeParam};
use crate::error::Result;
use crate::lexer::TokenKind;

use super::Parser;

pub fn parse_data_type(p: &mut Parser) -> Result<DataType> {
    let name = p.parse_ident()?;
    match name.as_str() {
        "Nullable" => {
            p.expect_punct('(')?;
            let inner = parse_data_type(p)?;
            p.expect_punct(')')?;
            Ok(DataType::Nullable(Box::new(inner)))
        }
        "Array" => {
            p.expect_punct('(')?;
            let inner = parse_data_type(p)?;
            p.expect_punct(')')?;
            Ok(DataType::Array(Box::new(inner)))
        }
        "LowCardinality" => {
            p.expect_punct('(')?;
            let inner = parse_data_type(p)?;
            p.expect_punct(')')?;
            Ok(DataType::LowCardinality(Box::new(inner)))
        }
        "Map" => {
            p.expect_punct('(')?;
            let key = parse_data_type(p)?;
            p.expect_punct(',')?;
            let value = parse_data_type(p)?;
            p.expect_punct(')')?;
            Ok(DataType::Map(Box::new(key), Box::new(value)))
        }
        "Tuple" => {
            p.expect_punct('(')?;
            let mut elements = Vec::new();
            loop {
                elements.push(parse_tuple_element(p)?);
                if !p.try_punct(',') {
                    break;
                }
            }
            p.expect_punct(')')?;
            Ok(DataType::Tuple(elements))
        }
        "Nested" => {
            p.expect_punct('(')?;
            let mut columns = Vec::new();
            loop {
                let name = p.parse_ident()?;
                let data_type = parse_data_type(p)?;
                columns.push(NestedColumn { name, data_type });
                if !p.try_punct(',') {
                    break;
                }
            }
            p.expect_punct(')')?;
            Ok(DataType::Nested(columns))
        }
        _ => {
            let params = if p.try_punct('(') {
                let params = parse_type_params(p)?;
                p.expect_punct(')')?;
                params
            } else {
                Vec::new()
            };
            Ok(DataType::Simple { name, params })
        }
    }
}

/// `name Type` when two identifiers stand in sequence, plain `Type`
/// otherwise. Distinguished with one token of lookahead.
fn parse_tuple_element(p: &mut Parser) -> Result<TupleElement> {
    let named = matches!(
        (p.peek().map(|t| t.kind.clone()), p.peek_nth(1).map(|t| t.kind.clone())),
        (
            Some(TokenKind::Ident) | Some(TokenKind::BacktickIdent),
            Some(TokenKind::Ident)
        )
    );
    if named {
        let name = p.parse_ident()?;
        let data_type = parse_data_type(p)?;
        Ok(TupleElement {
            name: Some(name),
            data_type
        })
    } else {
        Ok(TupleElement {
            name:      None,
            data_type: parse_data_type(p)?
        })
    }
}

fn parse_type_params(p: &mut Parser) -> Result<Vec<TypeParam>> {
    if p.check_punct(')') {
        return Ok(Vec::new());
    }
    let mut params = vec![parse_type_param(p)?];
    while p.try_punct(',') {
        params.push(parse_type_param(p)?);
    }
    Ok(params)
}

fn parse_type_param(p: &mut Parser) -> Result<TypeParam> {
    match p.peek().map(|t| t.kind.clone()) {
        Some(TokenKind::Number) => {
            let token = p.advance().expect("peeked");
            Ok(TypeParam::Number(token.text))
        }
        Some(TokenKind::Punct('-')) => {
            p.advance();
            let token = p.advance().ok_or_else(|| p.expected("a number"))?;
            if token.kind != TokenKind::Number {
                return Err(p.expected("a number"));
            }
            Ok(TypeParam::Number(format!("-{}", token.text)))
        }
        Some(TokenKind::String) => {
            let text = p.advance().expect("peeked").text;
            if p.try_punct('=') {
                let negative = p.try_punct('-');
                let value = p.parse_u64()? as i64;
                Ok(TypeParam::EnumValue {
                    name:  text,
                    value: Some(if negative { -value } else { value })
                })
            } else {
                Ok(TypeParam::String(text))
            }
        }
        Some(TokenKind::Ident) | Some(TokenKind::BacktickIdent) => {
            let name = p.parse_ident()?;
            if p.try_punct('(') {
                let params = parse_type_params(p)?;
                p.expect_punct(')')?;
                Ok(TypeParam::Function { name, params })
            } else {
                Ok(TypeParam::Ident(name))
            }
        }
        _ => Err(p.expected("a type parameter"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn data_type(text: &str) -> DataType {
        let mut p = Parser::new(tokenize(text).unwrap());
        parse_data_type(&mut p).unwrap()
    }

    #[test]
    fn simple_and_parameterized() {
        assert_eq!(data_type("UInt64"), DataType::simple("UInt64"));
        assert_eq!(data_type("FixedString(16)").to_string(), "FixedString(16)");
        assert_eq!(data_type("Decimal(18, 4)").to_string(), "Decimal(18, 4)");
        assert_eq!(data_type("DateTime64(3, 'UTC')").to_string(), "DateTime64(3, 'UTC')");
    }

    #[test]
    fn containers_nest() {
        assert_eq!(
            data_type("Array(Nullable(String))").to_string(),
            "Array(Nullable(String))"
        );
        assert_eq!(
            data_type("Map(String, Array(UInt8))").to_string(),
            "Map(String, Array(UInt8))"
        );
        assert_eq!(
            data_type("LowCardinality(String)").to_string(),
            "LowCardinality(String)"
        );
    }

    #[test]
    fn tuples_named_and_unnamed() {
        assert_eq!(data_type("Tuple(String, UInt8)").to_string(), "Tuple(String, UInt8)");
        assert_eq!(
            data_type("Tuple(name String, age UInt8)").to_string(),
            "Tuple(`name` String, `age` UInt8)"
        );
    }

    #[test]
    fn nested_columns() {
        assert_eq!(
            data_type("Nested(name String, age UInt8)").to_string(),
            "Nested(`name` String, `age` UInt8)"
        );
    }

    #[test]
    fn enums_keep_values() {
        assert_eq!(
            data_type("Enum8('a' = 1, 'b' = 2)").to_string(),
            "Enum8('a' = 1, 'b' = 2)"
        );
        assert_eq!(data_type("Enum8('a' = -1)").to_string(), "Enum8('a' = -1)");
    }

    #[test]
    fn aggregate_function_params() {
        assert_eq!(
            data_type("AggregateFunction(quantiles(0.5), UInt64)").to_string(),
            "AggregateFunction(quantiles(0.5), UInt64)"
        );
        assert_eq!(
            data_type("SimpleAggregateFunction(sum, Decimal(38, 10))").to_string(),
            "SimpleAggregateFunction(sum, Decimal(38, 10))"
        );
    }
}
