//! Error types and constructors for housekeeper.
//!
//! Every fallible operation in the crate fails with exactly one of the
//! categories below. The category decides the process exit code, so the
//! boundary between categories is part of the external contract:
//!
//! - **Parse** - ill-formed DDL, with line/column and an expected-set message
//! - **Import** - missing import file or an import cycle, with the chain
//! - **Validation** - a forbidden transition or a system-namespace touch
//! - **Planning** - ambiguous rename or internal plan inconsistency
//! - **Integrity** - sum-file or partial-hash mismatch
//! - **Runtime** - the server rejected a statement during execution
//! - **Config** - malformed YAML or a missing endpoint

use std::fmt;

use thiserror::Error;

/// Line/column position inside a DDL source text. 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line:   usize,
    pub column: usize
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Unified error for all housekeeper operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error at {location}: {message}")]
    Parse {
        message:  String,
        location: Location,
        snippet:  String
    },

    #[error("import error: {message}")]
    Import { message: String, chain: Vec<String> },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("planning error: {message}")]
    Planning { message: String },

    #[error("integrity error: {message}")]
    Integrity { message: String },

    #[error("runtime error: {message}")]
    Runtime { message: String },

    #[error("config error: {message}")]
    Config { message: String }
}

impl Error {
    /// Process exit code for this error category.
    ///
    /// 2 validation, 3 parse, 4 runtime, 5 integrity. Import and config
    /// failures belong to the pre-flight class and exit with 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Parse { .. } => 3,
            Error::Validation { .. } | Error::Planning { .. } => 2,
            Error::Import { .. } | Error::Config { .. } => 2,
            Error::Runtime { .. } => 4,
            Error::Integrity { .. } => 5
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Create a parse error with position and source snippet.
pub fn parse_error(
    message: impl Into<String>,
    location: Location,
    snippet: impl Into<String>
) -> Error {
    Error::Parse {
        message: message.into(),
        location,
        snippet: snippet.into()
    }
}

/// Create an import error carrying the chain of files that led here.
pub fn import_error(message: impl Into<String>, chain: Vec<String>) -> Error {
    Error::Import {
        message: message.into(),
        chain
    }
}

/// Create a validation error for a forbidden transition or namespace touch.
pub fn validation_error(message: impl Into<String>) -> Error {
    Error::Validation {
        message: message.into()
    }
}

/// Create a planning error (ambiguous rename, internal inconsistency).
pub fn planning_error(message: impl Into<String>) -> Error {
    Error::Planning {
        message: message.into()
    }
}

/// Create an integrity error (sum file or hash chain mismatch).
pub fn integrity_error(message: impl Into<String>) -> Error {
    Error::Integrity {
        message: message.into()
    }
}

/// Create a runtime error from a rejected statement or transport failure.
pub fn runtime_error(message: impl Into<String>) -> Error {
    Error::Runtime {
        message: message.into()
    }
}

/// Create a config error.
pub fn config_error(message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_mapping() {
        let loc = Location { line: 1, column: 1 };
        assert_eq!(parse_error("bad", loc, "x").exit_code(), 3);
        assert_eq!(validation_error("no").exit_code(), 2);
        assert_eq!(planning_error("dup").exit_code(), 2);
        assert_eq!(import_error("cycle", vec![]).exit_code(), 2);
        assert_eq!(config_error("yaml").exit_code(), 2);
        assert_eq!(runtime_error("boom").exit_code(), 4);
        assert_eq!(integrity_error("edited").exit_code(), 5);
    }

    #[test]
    fn display_includes_location() {
        let err = parse_error(
            "expected one of: TABLE, DATABASE",
            Location {
                line:   3,
                column: 8
            },
            "CREATE WIDGET"
        );
        let text = err.to_string();
        assert!(text.contains("line 3, column 8"));
        assert!(text.contains("expected one of"));
    }
}
