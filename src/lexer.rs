//! Tokenizer for ClickHouse DDL text.
//!
//! Produces a flat token stream with comments retained; the parser attaches
//! them to statements as leading/trailing comment arrays. Whitespace is
//! elided but line/column positions survive on every token for error
//! reporting. Keyword recognition is not done here: keywords are plain
//! [`TokenKind::Ident`] tokens matched case-insensitively by the parser.

use std::fmt;

use crate::error::{Location, Result, parse_error};

/// The kind of a lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `-- ...` comment; text excludes the `--` marker and the newline.
    LineComment,
    /// `/* ... */` comment; text excludes the delimiters.
    BlockComment,
    /// Single-quoted string literal; text is the unescaped content.
    String,
    /// Backtick-quoted identifier; text is the unquoted content.
    BacktickIdent,
    /// Integer or decimal literal; text is the raw spelling.
    Number,
    /// Bare identifier or keyword.
    Ident,
    /// `!=` or `<>`.
    NotEq,
    /// `<=`.
    LtEq,
    /// `>=`.
    GtEq,
    /// Single punctuation character from `(),.;=+-*/%<>[]!{}:?`.
    Punct(char)
}

/// One token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind:     TokenKind,
    pub text:     String,
    pub location: Location
}

impl Token {
    /// Case-insensitive keyword check. Only bare identifiers qualify;
    /// a backtick-quoted identifier never matches a keyword.
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(kw)
    }

    /// True for punctuation `ch`.
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }

    /// True for either comment kind.
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Punct(c) => write!(f, "{}", c),
            TokenKind::String => write!(f, "'{}'", self.text),
            TokenKind::BacktickIdent => write!(f, "`{}`", self.text),
            _ => write!(f, "{}", self.text)
        }
    }
}

struct Cursor<'a> {
    input:  &'a [u8],
    pos:    usize,
    line:   usize,
    column: usize
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input:  input.as_bytes(),
            pos:    0,
            line:   1,
            column: 1
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).map(|b| *b as char)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).map(|b| *b as char)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn location(&self) -> Location {
        Location {
            line:   self.line,
            column: self.column
        }
    }
}

/// Tokenize DDL text into a flat stream.
///
/// # Errors
///
/// Returns a parse error with position for unterminated strings, unterminated
/// block comments, unterminated backtick identifiers, and bytes outside the
/// token alphabet.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut cursor = Cursor::new(input);
    let mut tokens = Vec::new();

    while let Some(ch) = cursor.peek() {
        let location = cursor.location();
        match ch {
            c if c.is_whitespace() => {
                cursor.bump();
            }
            '-' if cursor.peek_at(1) == Some('-') => {
                cursor.bump();
                cursor.bump();
                let mut text = String::new();
                while let Some(c) = cursor.peek() {
                    if c == '\n' {
                        break;
                    }
                    text.push(c);
                    cursor.bump();
                }
                tokens.push(Token {
                    kind: TokenKind::LineComment,
                    text: text.trim().to_string(),
                    location
                });
            }
            '/' if cursor.peek_at(1) == Some('*') => {
                cursor.bump();
                cursor.bump();
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = cursor.peek() {
                    if c == '*' && cursor.peek_at(1) == Some('/') {
                        cursor.bump();
                        cursor.bump();
                        closed = true;
                        break;
                    }
                    text.push(c);
                    cursor.bump();
                }
                if !closed {
                    return Err(parse_error("unterminated block comment", location, "/*"));
                }
                tokens.push(Token {
                    kind: TokenKind::BlockComment,
                    text: text.trim().to_string(),
                    location
                });
            }
            '\'' => {
                cursor.bump();
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = cursor.bump() {
                    match c {
                        '\\' => {
                            // Backslash escapes: keep the escaped character.
                            match cursor.bump() {
                                Some('n') => text.push('\n'),
                                Some('t') => text.push('\t'),
                                Some(other) => text.push(other),
                                None => break
                            }
                        }
                        '\'' => {
                            // Doubled quote is an escaped quote.
                            if cursor.peek() == Some('\'') {
                                cursor.bump();
                                text.push('\'');
                            } else {
                                closed = true;
                                break;
                            }
                        }
                        other => text.push(other)
                    }
                }
                if !closed {
                    return Err(parse_error("unterminated string literal", location, "'"));
                }
                tokens.push(Token {
                    kind: TokenKind::String,
                    text,
                    location
                });
            }
            '`' => {
                cursor.bump();
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = cursor.bump() {
                    if c == '`' {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(parse_error("unterminated backtick identifier", location, "`"));
                }
                tokens.push(Token {
                    kind: TokenKind::BacktickIdent,
                    text,
                    location
                });
            }
            c if c.is_ascii_digit() => {
                let mut text = String::new();
                while let Some(c) = cursor.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        cursor.bump();
                    } else {
                        break;
                    }
                }
                if cursor.peek() == Some('.')
                    && cursor.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                {
                    text.push('.');
                    cursor.bump();
                    while let Some(c) = cursor.peek() {
                        if c.is_ascii_digit() {
                            text.push(c);
                            cursor.bump();
                        } else {
                            break;
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Number,
                    text,
                    location
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut text = String::new();
                while let Some(c) = cursor.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        text.push(c);
                        cursor.bump();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Ident,
                    text,
                    location
                });
            }
            '!' if cursor.peek_at(1) == Some('=') => {
                cursor.bump();
                cursor.bump();
                tokens.push(Token {
                    kind: TokenKind::NotEq,
                    text: "!=".to_string(),
                    location
                });
            }
            '<' if cursor.peek_at(1) == Some('>') => {
                cursor.bump();
                cursor.bump();
                tokens.push(Token {
                    kind: TokenKind::NotEq,
                    text: "!=".to_string(),
                    location
                });
            }
            '<' if cursor.peek_at(1) == Some('=') => {
                cursor.bump();
                cursor.bump();
                tokens.push(Token {
                    kind: TokenKind::LtEq,
                    text: "<=".to_string(),
                    location
                });
            }
            '>' if cursor.peek_at(1) == Some('=') => {
                cursor.bump();
                cursor.bump();
                tokens.push(Token {
                    kind: TokenKind::GtEq,
                    text: ">=".to_string(),
                    location
                });
            }
            '(' | ')' | ',' | '.' | ';' | '=' | '+' | '-' | '*' | '/' | '%' | '<' | '>' | '['
            | ']' | '!' | '{' | '}' | ':' | '?' => {
                cursor.bump();
                tokens.push(Token {
                    kind: TokenKind::Punct(ch),
                    text: ch.to_string(),
                    location
                });
            }
            other => {
                return Err(parse_error(
                    format!("unexpected character '{}'", other),
                    location,
                    other.to_string()
                ));
            }
        }
    }

    Ok(tokens)
}
