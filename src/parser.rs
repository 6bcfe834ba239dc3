//! Recursive-descent parser for the supported DDL surface.
//!
//! The driver owns a token cursor with bounded lookahead and dispatches per
//! top-level keyword to the statement rules in the submodules. Keyword
//! matching is case-insensitive over bare identifier tokens; backtick-quoted
//! identifiers never match keywords, which is how reserved-word collisions
//! are expressed in input.
//!
//! Comments lexically preceding a statement attach as its leading comments;
//! comments between the statement body and the terminating `;` attach as
//! trailing. Comments inside a statement body are dropped.

pub mod access;
pub mod alter;
pub mod column;
pub mod database;
pub mod dictionary;
pub mod expr;
pub mod function;
pub mod table;
pub mod types;
pub mod view;

use crate::ast::{Commented, Ident, QualifiedName, RawStatement, Statement};
use crate::error::{Error, Location, Result, parse_error};
use crate::lexer::{Token, TokenKind, tokenize};

/// Parse a full DDL text into a statement stream.
pub fn parse_statements(input: &str) -> Result<Vec<Statement>> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    parser.parse_all()
}

/// Parse a text expected to contain exactly one statement.
pub fn parse_single(input: &str) -> Result<Statement> {
    let statements = parse_statements(input)?;
    match statements.len() {
        1 => Ok(statements.into_iter().next().expect("checked length")),
        n => Err(parse_error(
            format!("expected exactly one statement, found {}", n),
            Location {
                line:   1,
                column: 1
            },
            input.lines().next().unwrap_or_default()
        ))
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos:    usize
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0
        }
    }

    /// Collect consecutive comment tokens from the cursor.
    fn take_comments(&mut self) -> Vec<String> {
        let mut comments = Vec::new();
        while let Some(token) = self.tokens.get(self.pos) {
            if token.is_comment() {
                comments.push(token.text.clone());
                self.pos += 1;
            } else {
                break;
            }
        }
        comments
    }

    fn skip_comments(&mut self) {
        while self.tokens.get(self.pos).is_some_and(Token::is_comment) {
            self.pos += 1;
        }
    }

    /// Peek the next non-comment token.
    pub fn peek(&self) -> Option<&Token> {
        self.peek_nth(0)
    }

    /// Peek the nth non-comment token ahead (0-based). The grammar needs
    /// at least four tokens of lookahead; this supports any depth.
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        let mut seen = 0;
        let mut pos = self.pos;
        while let Some(token) = self.tokens.get(pos) {
            if !token.is_comment() {
                if seen == n {
                    return Some(token);
                }
                seen += 1;
            }
            pos += 1;
        }
        None
    }

    /// Advance past the next non-comment token and return it.
    pub fn advance(&mut self) -> Option<Token> {
        self.skip_comments();
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.peek().is_none()
    }

    /// Location of the next token, or of the end of input.
    fn location(&self) -> Location {
        self.peek().map(|t| t.location).unwrap_or_else(|| {
            self.tokens.last().map(|t| t.location).unwrap_or(Location {
                line:   1,
                column: 1
            })
        })
    }

    /// Build a parse error with an expected-set message and a snippet of
    /// what was actually found.
    pub fn expected(&self, what: &str) -> Error {
        let found = self
            .peek()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "end of input".to_string());
        parse_error(format!("expected {}, found {}", what, found), self.location(), found)
    }

    /// True if the next token is the given keyword.
    pub fn check_keyword(&self, kw: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(kw))
    }

    /// True if the nth token ahead is the given keyword.
    pub fn check_keyword_nth(&self, n: usize, kw: &str) -> bool {
        self.peek_nth(n).is_some_and(|t| t.is_keyword(kw))
    }

    /// Consume the keyword if present.
    pub fn try_keyword(&mut self, kw: &str) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a run of keywords if all are present, atomically.
    pub fn try_keywords(&mut self, kws: &[&str]) -> bool {
        for (i, kw) in kws.iter().enumerate() {
            if !self.check_keyword_nth(i, kw) {
                return false;
            }
        }
        for _ in kws {
            self.advance();
        }
        true
    }

    pub fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if self.try_keyword(kw) {
            Ok(())
        } else {
            Err(self.expected(kw))
        }
    }

    pub fn check_punct(&self, ch: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(ch))
    }

    pub fn try_punct(&mut self, ch: char) -> bool {
        if self.check_punct(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_punct(&mut self, ch: char) -> Result<()> {
        if self.try_punct(ch) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{}'", ch)))
        }
    }

    /// Parse an identifier: bare or backtick-quoted.
    pub fn parse_ident(&mut self) -> Result<Ident> {
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Ident) | Some(TokenKind::BacktickIdent) => {
                Ok(self.advance().expect("peeked").text.into())
            }
            _ => Err(self.expected("an identifier"))
        }
    }

    /// Parse `name` or `db.name`.
    pub fn parse_qualified_name(&mut self) -> Result<QualifiedName> {
        let first = self.parse_ident()?;
        if self.try_punct('.') {
            let name = self.parse_ident()?;
            Ok(QualifiedName {
                database: Some(first),
                name
            })
        } else {
            Ok(QualifiedName {
                database: None,
                name: first
            })
        }
    }

    /// Parse a single-quoted string literal.
    pub fn parse_string(&mut self) -> Result<String> {
        if self.peek().is_some_and(|t| t.kind == TokenKind::String) {
            Ok(self.advance().expect("peeked").text)
        } else {
            Err(self.expected("a string literal"))
        }
    }

    /// Parse an unsigned integer literal.
    pub fn parse_u64(&mut self) -> Result<u64> {
        if self.peek().is_some_and(|t| t.kind == TokenKind::Number) {
            let token = self.advance().expect("peeked");
            token.text.parse().map_err(|_| {
                parse_error(
                    format!("expected an integer, found {}", token.text),
                    token.location,
                    token.text.clone()
                )
            })
        } else {
            Err(self.expected("an integer"))
        }
    }

    /// Parse an optional `ON CLUSTER name` clause.
    pub fn parse_on_cluster(&mut self) -> Result<Option<Ident>> {
        if self.try_keywords(&["ON", "CLUSTER"]) {
            Ok(Some(self.parse_ident()?))
        } else {
            Ok(None)
        }
    }

    /// Parse an optional trailing `COMMENT 'text'` clause.
    pub fn parse_opt_comment(&mut self) -> Result<Option<String>> {
        if self.try_keyword("COMMENT") {
            Ok(Some(self.parse_string()?))
        } else {
            Ok(None)
        }
    }

    /// Capture tokens up to (not including) the next top-level `;`,
    /// rendered canonically. Used for SELECT bodies and raw statements.
    pub fn capture_until_semicolon(&mut self) -> String {
        let mut captured: Vec<Token> = Vec::new();
        let mut depth: i32 = 0;
        loop {
            let Some(token) = self.tokens.get(self.pos) else {
                break;
            };
            if token.is_comment() {
                // A comment run directly before the terminating `;` is a
                // trailing comment; leave it for the statement driver.
                let mut j = self.pos;
                while self.tokens.get(j).is_some_and(Token::is_comment) {
                    j += 1;
                }
                match self.tokens.get(j) {
                    None => break,
                    Some(next) if next.is_punct(';') && depth == 0 => break,
                    _ => {
                        self.pos = j;
                        continue;
                    }
                }
            }
            match token.kind {
                TokenKind::Punct('(') | TokenKind::Punct('[') => depth += 1,
                TokenKind::Punct(')') | TokenKind::Punct(']') => depth -= 1,
                TokenKind::Punct(';') if depth == 0 => break,
                _ => {}
            }
            captured.push(token.clone());
            self.pos += 1;
        }
        canonical_join(&captured)
    }

    /// Capture a balanced parenthesized span, starting just after an
    /// already-consumed `(`, up to its matching `)`. Consumes the `)`.
    pub fn capture_balanced(&mut self) -> Result<String> {
        let mut captured: Vec<Token> = Vec::new();
        let mut depth: i32 = 0;
        loop {
            self.skip_comments();
            let Some(token) = self.tokens.get(self.pos) else {
                return Err(self.expected("')'"));
            };
            match token.kind {
                TokenKind::Punct('(') => depth += 1,
                TokenKind::Punct(')') => {
                    if depth == 0 {
                        self.pos += 1;
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            captured.push(token.clone());
            self.pos += 1;
        }
        Ok(canonical_join(&captured))
    }

    /// Parse the whole token stream into statements.
    pub fn parse_all(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            let leading = self.take_comments();
            if self.at_end() {
                // File-trailing comments have no statement to attach to and
                // are dropped, matching the attachment rules.
                break;
            }
            // Stray semicolons between statements are tolerated.
            if self.try_punct(';') {
                continue;
            }
            let mut statement = self.parse_statement()?;
            let trailing = self.take_comments();
            if !self.try_punct(';') && !self.at_end() {
                return Err(self.expected("';'"));
            }
            let commented = statement.commented_mut();
            *commented.leading_comments_mut() = leading;
            *commented.trailing_comments_mut() = trailing;
            statements.push(statement);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        if self.check_keyword("CREATE") || self.check_keyword("ATTACH") {
            return self.parse_create();
        }
        if self.check_keyword("ALTER") {
            return alter::parse_alter(self);
        }
        if self.check_keyword("DROP") {
            return alter::parse_drop(self);
        }
        if self.check_keyword("RENAME") {
            return alter::parse_rename(self);
        }
        if self.check_keyword("GRANT") {
            return access::parse_grant(self);
        }
        if self.check_keyword("REVOKE") {
            return access::parse_revoke(self);
        }
        if self.check_keyword("SET")
            || self.check_keyword("SELECT")
            || self.check_keyword("WITH")
            || self.check_keyword("DETACH")
        {
            let text = self.capture_until_semicolon();
            return Ok(Statement::Raw(RawStatement {
                leading_comments: Vec::new(),
                trailing_comments: Vec::new(),
                text
            }));
        }
        Err(self.expected(
            "one of: CREATE, ALTER, ATTACH, DETACH, DROP, RENAME, GRANT, REVOKE, SET, SELECT, \
             WITH"
        ))
    }

    fn parse_create(&mut self) -> Result<Statement> {
        // ATTACH parses like CREATE for the supported object kinds.
        if !self.try_keyword("CREATE") {
            self.expect_keyword("ATTACH")?;
        }
        let or_replace = self.try_keywords(&["OR", "REPLACE"]);

        if self.check_keyword("DATABASE") {
            return database::parse_create_database(self);
        }
        if self.check_keyword("TABLE") {
            return table::parse_create_table(self, or_replace);
        }
        if self.check_keyword("DICTIONARY") {
            return dictionary::parse_create_dictionary(self, or_replace);
        }
        if self.check_keyword("VIEW") || self.check_keywords_materialized_view() {
            return view::parse_create_view(self, or_replace);
        }
        if self.check_keyword("NAMED") {
            return table::parse_create_named_collection(self);
        }
        if self.check_keyword("ROLE") {
            return access::parse_create_role(self);
        }
        if self.check_keyword("USER") {
            return access::parse_create_user(self, or_replace);
        }
        if self.check_keyword("FUNCTION") {
            return function::parse_create_function(self);
        }
        Err(self.expected(
            "one of: DATABASE, TABLE, DICTIONARY, VIEW, MATERIALIZED VIEW, NAMED COLLECTION, \
             ROLE, USER, FUNCTION"
        ))
    }

    fn check_keywords_materialized_view(&self) -> bool {
        self.check_keyword("MATERIALIZED") && self.check_keyword_nth(1, "VIEW")
    }
}

/// Deterministic single-line rendering of a token span. Not pretty, but
/// stable: re-lexing the output and joining again yields the same bytes,
/// which is what the round-trip and hashing paths require.
pub fn canonical_join(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        if token.is_comment() {
            continue;
        }
        let need_space = match prev {
            None => false,
            Some(p) => {
                !(p.is_punct('(')
                    || p.is_punct('.')
                    || p.is_punct('[')
                    || token.is_punct(')')
                    || token.is_punct(']')
                    || token.is_punct(',')
                    || token.is_punct('.')
                    || token.is_punct('('))
            }
        };
        if need_space {
            out.push(' ');
        }
        out.push_str(&token.to_string());
        prev = Some(token);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookahead_skips_comments() {
        let tokens = tokenize("CREATE /* x */ TABLE -- y\n t").unwrap();
        let parser = Parser::new(tokens);
        assert!(parser.check_keyword("CREATE"));
        assert!(parser.check_keyword_nth(1, "TABLE"));
        assert_eq!(parser.peek_nth(2).unwrap().text, "t");
    }

    #[test]
    fn canonical_join_is_stable() {
        let text = "SELECT  a ,\n  sum( b )  FROM `db` . t WHERE x >= 1";
        let once = canonical_join(&tokenize(text).unwrap());
        let twice = canonical_join(&tokenize(&once).unwrap());
        assert_eq!(once, twice);
        assert_eq!(once, "SELECT a, sum(b) FROM `db`.t WHERE x >= 1");
    }

    #[test]
    fn comment_attachment() {
        let sql = "-- leading one\n-- leading two\nCREATE DATABASE d\n-- trailing\n;";
        let statements = parse_statements(sql).unwrap();
        let commented = statements[0].commented();
        assert_eq!(commented.leading_comments(), ["leading one", "leading two"]);
        assert_eq!(commented.trailing_comments(), ["trailing"]);
    }

    #[test]
    fn missing_semicolon_midstream_errors() {
        let err = parse_statements("CREATE DATABASE a CREATE DATABASE b;").unwrap_err();
        assert!(err.to_string().contains("expected"));
    }

    #[test]
    fn unknown_statement_lists_expected_set() {
        let err = parse_statements("TRUNCATE TABLE x;").unwrap_err();
        assert!(err.to_string().contains("one of"));
        assert_eq!(err.exit_code(), 3);
    }
}
