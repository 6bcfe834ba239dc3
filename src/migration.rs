//! Migration files, `h1:` content hashing, and the `housekeeper.sum` chain.
//!
//! A migration is a plain-text file of canonical DDL named
//! `YYYYMMDDHHMMSS.sql` (UTC). The sum file chains every migration's
//! content hash so both mutation and reordering are detectable:
//!
//! ```text
//! h1:<global>
//! <filename1> h1:<hash1>
//! <filename2> h1:<hash2>
//! ```
//!
//! Hashes are SHA-256, standard base64, prefixed `h1:` to version the
//! format. The per-statement hashes that drive resume are computed over
//! each statement's canonical rendering, so whitespace and comment edits
//! do not invalidate progress, while any semantic edit does.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::ast::Statement;
use crate::diff::Plan;
use crate::error::{Result, integrity_error, runtime_error};
use crate::format::canonical_body;
use crate::parser::parse_statements;

pub const SUM_FILE: &str = "housekeeper.sum";

/// `h1:` + base64(SHA-256(data)).
pub fn h1(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    format!("h1:{}", BASE64.encode(digest))
}

/// Version stamp for a migration generated now.
pub fn version_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// One parsed migration.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version:    String,
    pub statements: Vec<Statement>
}

impl Migration {
    /// Parse a migration file's content.
    pub fn parse(version: impl Into<String>, text: &str) -> Result<Self> {
        Ok(Self {
            version:    version.into(),
            statements: parse_statements(text)?
        })
    }

    /// Read and parse `<version>.sql`.
    pub fn read(path: &Path) -> Result<Self> {
        let version = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let text = fs::read_to_string(path)
            .map_err(|e| runtime_error(format!("cannot read {}: {}", path.display(), e)))?;
        Self::parse(version, &text)
    }

    /// Canonical rendering of one statement, the hashing unit.
    fn canonical_statement(statement: &Statement) -> String {
        format!("{};", canonical_body(statement))
    }

    /// Per-statement hashes, in order.
    pub fn partial_hashes(&self) -> Vec<String> {
        self.statements
            .iter()
            .map(|s| h1(&Self::canonical_statement(s)))
            .collect()
    }

    /// Hash over the whole migration's canonical rendering.
    pub fn hash(&self) -> String {
        let body: String = self
            .statements
            .iter()
            .map(|s| Self::canonical_statement(s))
            .collect::<Vec<_>>()
            .join("\n");
        h1(&body)
    }

    /// Render a freshly planned migration, header included.
    pub fn render_new(plan: &Plan, generated_at: DateTime<Utc>) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "-- Generated by housekeeper at {}\n",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str("-- Down strategy: swap current and target, then regenerate.\n\n");
        out.push_str(&plan.render());
        out
    }
}

/// Lexically sorted `<version>.sql` paths of a migrations directory.
pub fn list_migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
            .collect(),
        Err(_) => Vec::new()
    };
    files.sort();
    Ok(files)
}

/// The parsed `housekeeper.sum` chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SumFile {
    pub entries: Vec<(String, String)>
}

impl SumFile {
    fn global_hash(entries: &[(String, String)]) -> String {
        let concatenated: String = entries
            .iter()
            .map(|(_, hash)| hash.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        h1(&concatenated)
    }

    /// Compute the chain for a migrations directory from file contents.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for path in list_migration_files(dir)? {
            let text = fs::read_to_string(&path)
                .map_err(|e| runtime_error(format!("cannot read {}: {}", path.display(), e)))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            entries.push((name, h1(&text)));
        }
        Ok(Self { entries })
    }

    /// Parse sum file text; the global line must match the entry lines.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let global = lines
            .next()
            .ok_or_else(|| integrity_error("sum file is empty"))?
            .trim()
            .to_string();
        let mut entries = Vec::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (name, hash) = line
                .split_once(' ')
                .ok_or_else(|| integrity_error(format!("malformed sum line: {}", line)))?;
            entries.push((name.to_string(), hash.to_string()));
        }
        let parsed = Self { entries };
        if Self::global_hash(&parsed.entries) != global {
            return Err(integrity_error(
                "sum file global hash does not match its entries"
            ));
        }
        Ok(parsed)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&Self::global_hash(&self.entries));
        out.push('\n');
        for (name, hash) in &self.entries {
            out.push_str(&format!("{} {}\n", name, hash));
        }
        out
    }

    /// Verify a directory against this chain. Detects edited files,
    /// missing files, unlisted files, and reordering.
    pub fn verify_dir(&self, dir: &Path) -> Result<()> {
        let actual = Self::from_dir(dir)?;
        if actual == *self {
            return Ok(());
        }
        for ((expected_name, expected_hash), (actual_name, actual_hash)) in
            self.entries.iter().zip(&actual.entries)
        {
            if expected_name != actual_name {
                return Err(integrity_error(format!(
                    "migration order mismatch: sum file lists {} where {} was found",
                    expected_name, actual_name
                )));
            }
            if expected_hash != actual_hash {
                return Err(integrity_error(format!(
                    "migration {} has been modified since it was recorded",
                    expected_name
                )));
            }
        }
        if actual.entries.len() > self.entries.len() {
            return Err(integrity_error(format!(
                "migration {} is not recorded in {}",
                actual.entries[self.entries.len()].0, SUM_FILE
            )));
        }
        Err(integrity_error(format!(
            "migration {} is recorded in {} but missing on disk",
            self.entries[actual.entries.len()].0, SUM_FILE
        )))
    }

    /// Load `dir/housekeeper.sum`, or an empty chain when absent.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SUM_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text),
            Err(_) => Ok(Self::default())
        }
    }

    /// Write the chain for `dir` back to `dir/housekeeper.sum`.
    pub fn write(dir: &Path) -> Result<Self> {
        let sum = Self::from_dir(dir)?;
        fs::write(dir.join(SUM_FILE), sum.render())
            .map_err(|e| runtime_error(format!("cannot write {}: {}", SUM_FILE, e)))?;
        Ok(sum)
    }
}
