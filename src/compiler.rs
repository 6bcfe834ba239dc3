//! Schema compilation: import expansion, preprocessing, parsing.
//!
//! A schema entrypoint is a `.sql` file. A comment line of the exact shape
//!
//! ```sql
//! -- housekeeper:import relative/path.sql
//! ```
//!
//! is replaced in place by the (recursively expanded) content of the
//! referenced file, resolved relative to the importing file's directory.
//! Order is preserved and the directive itself never reaches the parser, so
//! it cannot attach to a statement as a comment.
//!
//! Directory compilation parses every top-level `.sql` file in lexical
//! order; the per-file parses fan out across threads and are concatenated
//! in order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;

use crate::ast::Statement;
use crate::error::{Result, import_error};
use crate::parser::parse_statements;
use crate::preprocessor::normalize_aliases;

static IMPORT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*--\s*housekeeper:import\s+(\S+)\s*$").expect("valid regex")
});

/// Compile one schema entrypoint file into a statement stream.
pub fn compile_file(path: &Path) -> Result<Vec<Statement>> {
    let mut chain = Vec::new();
    let expanded = expand_imports(path, &mut chain)?;
    compile_text(&expanded)
}

/// Compile already-expanded DDL text.
pub fn compile_text(input: &str) -> Result<Vec<Statement>> {
    parse_statements(&normalize_aliases(input))
}

/// Compile every top-level `.sql` file of a directory, in lexical filename
/// order. Parses run in parallel; the result order is deterministic.
pub fn compile_dir(dir: &Path) -> Result<Vec<Statement>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| import_error(format!("cannot read directory {}: {}", dir.display(), e), vec![]))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    files.sort();

    let parsed: Vec<Result<Vec<Statement>>> =
        files.par_iter().map(|path| compile_file(path)).collect();

    let mut statements = Vec::new();
    for result in parsed {
        statements.extend(result?);
    }
    Ok(statements)
}

fn chain_strings(chain: &[PathBuf]) -> Vec<String> {
    chain.iter().map(|p| p.display().to_string()).collect()
}

fn expand_imports(path: &Path, chain: &mut Vec<PathBuf>) -> Result<String> {
    let canonical = path.canonicalize().map_err(|e| {
        import_error(
            format!("cannot resolve {}: {}", path.display(), e),
            chain_strings(chain)
        )
    })?;
    if chain.contains(&canonical) {
        let mut cycle = chain_strings(chain);
        cycle.push(canonical.display().to_string());
        return Err(import_error(
            format!("import cycle through {}", canonical.display()),
            cycle
        ));
    }
    chain.push(canonical.clone());

    let text = fs::read_to_string(&canonical).map_err(|e| {
        import_error(
            format!("cannot read {}: {}", canonical.display(), e),
            chain_strings(chain)
        )
    })?;
    let base = canonical.parent().unwrap_or_else(|| Path::new("."));

    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if let Some(caps) = IMPORT_REGEX.captures(line) {
            let target = base.join(&caps[1]);
            out.push_str(&expand_imports(&target, chain)?);
            if !out.ends_with('\n') {
                out.push('\n');
            }
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }

    chain.pop();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::ast::Commented as _;

    use super::*;

    #[test]
    fn expands_imports_in_place() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("main.sql"),
            "CREATE DATABASE app;\n-- housekeeper:import tables/users.sql\nCREATE DATABASE tail;\n"
        )
        .unwrap();
        fs::create_dir(dir.path().join("tables")).unwrap();
        fs::write(
            dir.path().join("tables/users.sql"),
            "CREATE TABLE app.users (id UInt64) ENGINE = MergeTree() ORDER BY id;\n"
        )
        .unwrap();

        let statements = compile_file(&dir.path().join("main.sql")).unwrap();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].to_string().contains("`app`"));
        assert!(statements[1].to_string().contains("`app`.`users`"));
        assert!(statements[2].to_string().contains("`tail`"));
    }

    #[test]
    fn nested_imports_resolve_relative_to_importer() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("main.sql"), "-- housekeeper:import a/mid.sql\n").unwrap();
        fs::write(dir.path().join("a/mid.sql"), "-- housekeeper:import b/leaf.sql\n").unwrap();
        fs::write(dir.path().join("a/b/leaf.sql"), "CREATE DATABASE leaf;\n").unwrap();

        let statements = compile_file(&dir.path().join("main.sql")).unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].to_string().contains("`leaf`"));
    }

    #[test]
    fn cycle_is_an_import_error_with_chain() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.sql"), "-- housekeeper:import b.sql\n").unwrap();
        fs::write(dir.path().join("b.sql"), "-- housekeeper:import a.sql\n").unwrap();

        let err = compile_file(&dir.path().join("a.sql")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        match err {
            crate::error::Error::Import { message, chain } => {
                assert!(message.contains("cycle"));
                assert!(chain.len() >= 2);
            }
            other => panic!("expected import error, got {}", other)
        }
    }

    #[test]
    fn missing_import_is_an_import_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.sql"), "-- housekeeper:import gone.sql\n").unwrap();
        let err = compile_file(&dir.path().join("main.sql")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Import { .. }));
    }

    #[test]
    fn directive_never_attaches_as_comment() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("main.sql"),
            "-- housekeeper:import other.sql\nCREATE DATABASE app;\n"
        )
        .unwrap();
        fs::write(dir.path().join("other.sql"), "CREATE DATABASE first;\n").unwrap();

        let statements = compile_file(&dir.path().join("main.sql")).unwrap();
        assert_eq!(statements.len(), 2);
        for statement in &statements {
            assert!(
                statement
                    .commented()
                    .leading_comments()
                    .iter()
                    .all(|c| !c.contains("housekeeper:import"))
            );
        }
    }

    #[test]
    fn dir_compile_is_lexical_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("02_tables.sql"), "CREATE DATABASE b;\n").unwrap();
        fs::write(dir.path().join("01_databases.sql"), "CREATE DATABASE a;\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored\n").unwrap();

        let statements = compile_dir(dir.path()).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].to_string().contains("`a`"));
        assert!(statements[1].to_string().contains("`b`"));
    }
}
