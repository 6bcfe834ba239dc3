//! `CREATE DICTIONARY` rule.

use crate::ast::{CreateDictionary, DictionaryColumn, DictionaryLayout, DictionaryLifetime,
                 DictionarySource, Expr, Ident, Statement};
use crate::error::Result;
use crate::lexer::TokenKind;

use super::{Parser, expr::parse_expr, table::parse_settings_list, types::parse_data_type};

pub fn parse_create_dictionary(p: &mut Parser, or_replace: bool) -> Result<Statement> {
    p.expect_keyword("DICTIONARY")?;
    let if_not_exists = p.try_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_qualified_name()?;
    let cluster = p.parse_on_cluster()?;

    let mut dictionary = CreateDictionary {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        or_replace,
        if_not_exists,
        name,
        cluster,
        columns: Vec::new(),
        primary_key: Default::default(),
        source: None,
        layout: None,
        lifetime: None,
        settings: Default::default(),
        comment: None
    };

    p.expect_punct('(')?;
    if !p.check_punct(')') {
        loop {
            dictionary.columns.push(parse_dictionary_column(p)?);
            if !p.try_punct(',') {
                break;
            }
        }
    }
    p.expect_punct(')')?;

    loop {
        if p.try_keywords(&["PRIMARY", "KEY"]) {
            loop {
                dictionary.primary_key.push(p.parse_ident()?);
                if !p.try_punct(',') {
                    break;
                }
            }
        } else if p.try_keyword("SOURCE") {
            p.expect_punct('(')?;
            let name = p.parse_ident()?;
            p.expect_punct('(')?;
            let params = parse_kv_params(p)?;
            p.expect_punct(')')?;
            p.expect_punct(')')?;
            dictionary.source = Some(DictionarySource { name, params });
        } else if p.try_keyword("LAYOUT") {
            p.expect_punct('(')?;
            let name = p.parse_ident()?;
            p.expect_punct('(')?;
            let params = parse_kv_params(p)?;
            p.expect_punct(')')?;
            p.expect_punct(')')?;
            dictionary.layout = Some(DictionaryLayout { name, params });
        } else if p.try_keyword("LIFETIME") {
            p.expect_punct('(')?;
            if p.try_keyword("MIN") {
                let min = p.parse_u64()?;
                p.expect_keyword("MAX")?;
                let max = p.parse_u64()?;
                dictionary.lifetime = Some(DictionaryLifetime::MinMax { min, max });
            } else {
                dictionary.lifetime = Some(DictionaryLifetime::Single(p.parse_u64()?));
            }
            p.expect_punct(')')?;
        } else if p.try_keyword("SETTINGS") {
            p.expect_punct('(')?;
            dictionary.settings = parse_settings_list(p)?;
            p.expect_punct(')')?;
        } else if p.try_keyword("COMMENT") {
            dictionary.comment = Some(p.parse_string()?);
        } else {
            break;
        }
    }

    Ok(Statement::CreateDictionary(dictionary))
}

fn parse_dictionary_column(p: &mut Parser) -> Result<DictionaryColumn> {
    let name = p.parse_ident()?;
    let data_type = parse_data_type(p)?;
    let mut column = DictionaryColumn {
        name,
        data_type,
        default: None,
        expression: None,
        hierarchical: false,
        injective: false,
        is_object_id: false
    };
    loop {
        if p.try_keyword("DEFAULT") {
            column.default = Some(parse_expr(p)?);
        } else if p.try_keyword("EXPRESSION") {
            column.expression = Some(parse_expr(p)?);
        } else if p.try_keyword("HIERARCHICAL") {
            column.hierarchical = true;
        } else if p.try_keyword("INJECTIVE") {
            column.injective = true;
        } else if p.try_keyword("IS_OBJECT_ID") {
            column.is_object_id = true;
        } else {
            break;
        }
    }
    Ok(column)
}

/// `KEY value KEY value ...` pairs inside SOURCE/LAYOUT bodies. Values are
/// string, number, or identifier primaries.
fn parse_kv_params(p: &mut Parser) -> Result<Vec<(Ident, Expr)>> {
    let mut params = Vec::new();
    while !p.check_punct(')') {
        let key = p.parse_ident()?;
        let value = match p.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::String) => Expr::string(p.parse_string()?),
            Some(TokenKind::Number) => {
                let token = p.advance().expect("peeked");
                Expr::number(token.text)
            }
            Some(TokenKind::Ident) | Some(TokenKind::BacktickIdent) => {
                Expr::ident(p.parse_ident()?)
            }
            _ => return Err(p.expected("a source parameter value"))
        };
        params.push((key, value));
    }
    Ok(params)
}
