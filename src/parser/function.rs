//! `CREATE FUNCTION name AS (args) -> expression`.

use crate::ast::{CreateFunction, Statement};
use crate::error::Result;

use super::{Parser, expr::parse_expr};

pub fn parse_create_function(p: &mut Parser) -> Result<Statement> {
    p.expect_keyword("FUNCTION")?;
    let if_not_exists = p.try_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    p.expect_keyword("AS")?;

    let mut params = Vec::new();
    if p.try_punct('(') {
        if !p.check_punct(')') {
            params.push(p.parse_ident()?);
            while p.try_punct(',') {
                params.push(p.parse_ident()?);
            }
        }
        p.expect_punct(')')?;
    } else {
        // Single-parameter lambdas may omit the parentheses.
        params.push(p.parse_ident()?);
    }

    p.expect_punct('-')?;
    p.expect_punct('>')?;
    let body = parse_expr(p)?;

    Ok(Statement::CreateFunction(CreateFunction {
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
        if_not_exists,
        name,
        cluster,
        params,
        body
    }))
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_single;

    #[test]
    fn two_parameter_lambda() {
        let s = parse_single("CREATE FUNCTION linear AS (k, b) -> k * 2 + b;").unwrap();
        assert_eq!(
            s.to_string(),
            "CREATE FUNCTION `linear` AS (`k`, `b`) -> `k` * 2 + `b`"
        );
    }

    #[test]
    fn unparenthesized_single_parameter() {
        let s = parse_single("CREATE FUNCTION double AS x -> x * 2;").unwrap();
        assert_eq!(s.to_string(), "CREATE FUNCTION `double` AS (`x`) -> `x` * 2");
    }

    #[test]
    fn zero_parameters() {
        let s = parse_single("CREATE FUNCTION pi2 AS () -> 3.14 * 2;").unwrap();
        assert_eq!(s.to_string(), "CREATE FUNCTION `pi2` AS () -> 3.14 * 2");
    }
}
