//! Expression grammar with explicit precedence, lowest to highest:
//! `OR` -> `AND` -> `NOT` -> comparison (`=`, `!=`, `<`, `>`, `<=`, `>=`,
//! `LIKE`, `IN`, `BETWEEN`, `IS NULL` and their negations) -> additive ->
//! multiplicative -> unary `+`/`-` -> primary. `CASE ... END` and
//! `INTERVAL` are self-delimiting primaries; window functions are a
//! postfix `OVER (...)` on function calls.

use crate::ast::{BinaryOperator, CaseBranch, Expr, Literal, UnaryOperator};
use crate::error::Result;
use crate::lexer::TokenKind;

use super::Parser;

pub fn parse_expr(p: &mut Parser) -> Result<Expr> {
    parse_or(p)
}

/// Comma-separated expression list; the caller owns the delimiters.
pub fn parse_expr_list(p: &mut Parser) -> Result<Vec<Expr>> {
    let mut items = vec![parse_expr(p)?];
    while p.try_punct(',') {
        items.push(parse_expr(p)?);
    }
    Ok(items)
}

fn parse_or(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_and(p)?;
    while p.try_keyword("OR") {
        let right = parse_and(p)?;
        left = Expr::BinaryOp {
            left:  Box::new(left),
            op:    BinaryOperator::Or,
            right: Box::new(right)
        };
    }
    Ok(left)
}

fn parse_and(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_not(p)?;
    while p.try_keyword("AND") {
        let right = parse_not(p)?;
        left = Expr::BinaryOp {
            left:  Box::new(left),
            op:    BinaryOperator::And,
            right: Box::new(right)
        };
    }
    Ok(left)
}

fn parse_not(p: &mut Parser) -> Result<Expr> {
    if p.try_keyword("NOT") {
        let expr = parse_not(p)?;
        Ok(Expr::UnaryOp {
            op:   UnaryOperator::Not,
            expr: Box::new(expr)
        })
    } else {
        parse_comparison(p)
    }
}

fn parse_comparison(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_additive(p)?;
    loop {
        let op = if p.peek().is_some_and(|t| t.kind == TokenKind::NotEq) {
            p.advance();
            Some(BinaryOperator::NotEq)
        } else if p.peek().is_some_and(|t| t.kind == TokenKind::LtEq) {
            p.advance();
            Some(BinaryOperator::LtEq)
        } else if p.peek().is_some_and(|t| t.kind == TokenKind::GtEq) {
            p.advance();
            Some(BinaryOperator::GtEq)
        } else if p.try_punct('=') {
            Some(BinaryOperator::Eq)
        } else if p.try_punct('<') {
            Some(BinaryOperator::Lt)
        } else if p.try_punct('>') {
            Some(BinaryOperator::Gt)
        } else if p.try_keyword("LIKE") {
            Some(BinaryOperator::Like)
        } else if p.try_keywords(&["NOT", "LIKE"]) {
            Some(BinaryOperator::NotLike)
        } else {
            None
        };
        if let Some(op) = op {
            let right = parse_additive(p)?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right)
            };
            continue;
        }

        if p.check_keyword("IN") || (p.check_keyword("NOT") && p.check_keyword_nth(1, "IN")) {
            let negated = p.try_keyword("NOT");
            p.expect_keyword("IN")?;
            p.expect_punct('(')?;
            let list = parse_expr_list(p)?;
            p.expect_punct(')')?;
            left = Expr::InList {
                expr: Box::new(left),
                negated,
                list
            };
            continue;
        }
        if p.check_keyword("BETWEEN")
            || (p.check_keyword("NOT") && p.check_keyword_nth(1, "BETWEEN"))
        {
            let negated = p.try_keyword("NOT");
            p.expect_keyword("BETWEEN")?;
            let low = parse_additive(p)?;
            p.expect_keyword("AND")?;
            let high = parse_additive(p)?;
            left = Expr::Between {
                expr: Box::new(left),
                negated,
                low: Box::new(low),
                high: Box::new(high)
            };
            continue;
        }
        if p.try_keyword("IS") {
            let negated = p.try_keyword("NOT");
            p.expect_keyword("NULL")?;
            left = Expr::IsNull {
                expr: Box::new(left),
                negated
            };
            continue;
        }
        break;
    }
    Ok(left)
}

fn parse_additive(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_multiplicative(p)?;
    loop {
        let op = if p.try_punct('+') {
            BinaryOperator::Plus
        } else if p.try_punct('-') {
            BinaryOperator::Minus
        } else {
            break;
        };
        let right = parse_multiplicative(p)?;
        left = Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right)
        };
    }
    Ok(left)
}

fn parse_multiplicative(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_unary(p)?;
    loop {
        let op = if p.try_punct('*') {
            BinaryOperator::Multiply
        } else if p.try_punct('/') {
            BinaryOperator::Divide
        } else if p.try_punct('%') {
            BinaryOperator::Modulo
        } else {
            break;
        };
        let right = parse_unary(p)?;
        left = Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right)
        };
    }
    Ok(left)
}

fn parse_unary(p: &mut Parser) -> Result<Expr> {
    if p.try_punct('-') {
        let expr = parse_unary(p)?;
        return Ok(Expr::UnaryOp {
            op:   UnaryOperator::Minus,
            expr: Box::new(expr)
        });
    }
    if p.try_punct('+') {
        let expr = parse_unary(p)?;
        return Ok(Expr::UnaryOp {
            op:   UnaryOperator::Plus,
            expr: Box::new(expr)
        });
    }
    parse_primary(p)
}

fn parse_primary(p: &mut Parser) -> Result<Expr> {
    if p.check_keyword("CASE") {
        return parse_case(p);
    }
    if p.try_keyword("INTERVAL") {
        let value = parse_unary(p)?;
        let unit = p.parse_ident()?;
        return Ok(Expr::Interval {
            value: Box::new(value),
            unit
        });
    }
    if p.try_keyword("NULL") {
        return Ok(Expr::Literal(Literal::Null));
    }

    match p.peek().map(|t| t.kind.clone()) {
        Some(TokenKind::Number) => {
            let token = p.advance().expect("peeked");
            Ok(Expr::Literal(Literal::Number(token.text)))
        }
        Some(TokenKind::String) => {
            let token = p.advance().expect("peeked");
            Ok(Expr::Literal(Literal::String(token.text)))
        }
        Some(TokenKind::Punct('(')) => {
            p.advance();
            let items = parse_expr_list(p)?;
            p.expect_punct(')')?;
            if items.len() == 1 {
                Ok(items.into_iter().next().expect("checked length"))
            } else {
                Ok(Expr::Tuple(items))
            }
        }
        Some(TokenKind::Punct('[')) => {
            p.advance();
            let items = if p.check_punct(']') {
                Vec::new()
            } else {
                parse_expr_list(p)?
            };
            p.expect_punct(']')?;
            Ok(Expr::Array(items))
        }
        Some(TokenKind::Punct('*')) => {
            p.advance();
            Ok(Expr::Wildcard)
        }
        Some(TokenKind::Ident) | Some(TokenKind::BacktickIdent) => parse_reference(p),
        _ => Err(p.expected("an expression"))
    }
}

/// Identifier reference or function call, with optional `OVER (...)`.
fn parse_reference(p: &mut Parser) -> Result<Expr> {
    let first = p.parse_ident()?;

    // A call only when the opening paren directly follows a single-segment
    // name; qualified references are never calls.
    if p.check_punct('(') {
        p.advance();
        let args = if p.check_punct(')') {
            Vec::new()
        } else {
            parse_expr_list(p)?
        };
        p.expect_punct(')')?;
        let over = if p.try_keyword("OVER") {
            p.expect_punct('(')?;
            Some(p.capture_balanced()?)
        } else {
            None
        };
        return Ok(Expr::Function {
            name: first,
            args,
            over
        });
    }

    let mut parts = vec![first];
    while p.try_punct('.') {
        parts.push(p.parse_ident()?);
    }
    Ok(Expr::Ident(parts))
}

fn parse_case(p: &mut Parser) -> Result<Expr> {
    p.expect_keyword("CASE")?;
    let operand = if p.check_keyword("WHEN") {
        None
    } else {
        Some(Box::new(parse_expr(p)?))
    };
    let mut branches = Vec::new();
    while p.try_keyword("WHEN") {
        let when = parse_expr(p)?;
        p.expect_keyword("THEN")?;
        let then = parse_expr(p)?;
        branches.push(CaseBranch { when, then });
    }
    if branches.is_empty() {
        return Err(p.expected("WHEN"));
    }
    let else_arm = if p.try_keyword("ELSE") {
        Some(Box::new(parse_expr(p)?))
    } else {
        None
    };
    p.expect_keyword("END")?;
    Ok(Expr::Case {
        operand,
        branches,
        else_arm
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn expr(text: &str) -> Expr {
        let mut p = Parser::new(tokenize(text).unwrap());
        parse_expr(&mut p).unwrap()
    }

    #[test]
    fn precedence_ladder() {
        assert_eq!(expr("a + b * c").to_string(), "`a` + `b` * `c`");
        assert_eq!(expr("(a + b) * c").to_string(), "(`a` + `b`) * `c`");
        assert_eq!(
            expr("a = 1 AND b != 2 OR NOT c").to_string(),
            "`a` = 1 AND `b` != 2 OR NOT `c`"
        );
    }

    #[test]
    fn function_calls_and_windows() {
        assert_eq!(expr("now()").to_string(), "now()");
        assert_eq!(expr("count(*)").to_string(), "count(*)");
        assert_eq!(
            expr("sum(x) OVER (PARTITION BY y)").to_string(),
            "sum(`x`) OVER (PARTITION BY y)"
        );
    }

    #[test]
    fn interval_and_ttl_shapes() {
        assert_eq!(
            expr("event_date + INTERVAL 90 DAY").to_string(),
            "`event_date` + INTERVAL 90 DAY"
        );
    }

    #[test]
    fn comparison_suffixes() {
        assert_eq!(expr("x IS NOT NULL").to_string(), "`x` IS NOT NULL");
        assert_eq!(expr("x NOT IN (1, 2)").to_string(), "`x` NOT IN (1, 2)");
        assert_eq!(
            expr("x BETWEEN 1 AND 10 AND y = 2").to_string(),
            "`x` BETWEEN 1 AND 10 AND `y` = 2"
        );
        assert_eq!(expr("name NOT LIKE '%x%'").to_string(), "`name` NOT LIKE '%x%'");
    }

    #[test]
    fn case_expressions() {
        assert_eq!(
            expr("CASE WHEN a > 1 THEN 'hi' ELSE 'lo' END").to_string(),
            "CASE WHEN `a` > 1 THEN 'hi' ELSE 'lo' END"
        );
        assert_eq!(
            expr("CASE kind WHEN 1 THEN 'a' END").to_string(),
            "CASE `kind` WHEN 1 THEN 'a' END"
        );
    }

    #[test]
    fn qualified_references() {
        assert_eq!(expr("db.t.col").to_string(), "`db`.`t`.`col`");
        assert_eq!(expr("`order`.`from`").to_string(), "`order`.`from`");
    }

    #[test]
    fn tuples_and_arrays() {
        assert_eq!(expr("(a, b)").to_string(), "(`a`, `b`)");
        assert_eq!(expr("[1, 2, 3]").to_string(), "[1, 2, 3]");
    }
}
