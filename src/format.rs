//! Canonical DDL printer.
//!
//! Emits a single deterministic form for every AST node: keywords
//! upper-case, every identifier backtick-quoted, one canonical clause
//! order. The differ's migration output, the `h1:` hashes, and the
//! round-trip property all depend on this module producing the same bytes
//! for structurally equal trees.

use std::fmt::{self, Write as _};

use crate::ast::{AlterDatabase, AlterNamedCollection, AlterRole, AlterTable, AlterTableOp,
                 BinaryOperator, CaseBranch, Codec, CollectionAlterOp, CollectionParam, Column,
                 ColumnDefault, Commented, CreateDatabase, CreateDictionary, CreateFunction,
                 CreateNamedCollection, CreateRole, CreateTable, CreateUser, CreateView,
                 DataType, DictionaryLifetime, DropObject, Engine, Expr, GrantStatement,
                 GrantTarget, Ident, Literal, Privilege, QualifiedName, RawStatement,
                 RenameDatabase, RenameTable, RevokeStatement, Settings, Statement,
                 TableConstraint, TableIndex, TypeParam, UnaryOperator};

/// Escape a string literal body for single-quoted emission.
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other)
        }
    }
    out
}

fn write_qualified(f: &mut fmt::Formatter<'_>, name: &QualifiedName) -> fmt::Result {
    if let Some(db) = &name.database {
        write!(f, "`{}`.", db)?;
    }
    write!(f, "`{}`", name.name)
}

fn write_cluster(f: &mut fmt::Formatter<'_>, cluster: &Option<Ident>) -> fmt::Result {
    if let Some(c) = cluster {
        write!(f, " ON CLUSTER `{}`", c)?;
    }
    Ok(())
}

fn write_settings(f: &mut fmt::Formatter<'_>, settings: &Settings) -> fmt::Result {
    let mut first = true;
    for (key, value) in settings {
        if !first {
            write!(f, ", ")?;
        }
        first = false;
        write!(f, "{} = {}", key, value)?;
    }
    Ok(())
}

// Expression precedence for minimal-parenthesis emission. Mirrors the
// parser's ladder so format -> parse reproduces the same tree.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Case { .. } => 0,
        Expr::BinaryOp { op, .. } => match op {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::Gt
            | BinaryOperator::LtEq
            | BinaryOperator::GtEq
            | BinaryOperator::Like
            | BinaryOperator::NotLike => 4,
            BinaryOperator::Plus | BinaryOperator::Minus => 5,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 6
        },
        Expr::UnaryOp { op, .. } => match op {
            UnaryOperator::Not => 3,
            UnaryOperator::Plus | UnaryOperator::Minus => 7
        },
        Expr::Between { .. } | Expr::InList { .. } | Expr::IsNull { .. } => 4,
        _ => 8
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, min: u8) -> fmt::Result {
    if precedence(expr) < min {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(parts) => {
                let mut first = true;
                for part in parts {
                    if !first {
                        write!(f, ".")?;
                    }
                    first = false;
                    write!(f, "`{}`", part)?;
                }
                Ok(())
            }
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Wildcard => write!(f, "*"),
            Expr::Function { name, args, over } => {
                write!(f, "{}(", name)?;
                let mut first = true;
                for arg in args {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")?;
                if let Some(spec) = over {
                    write!(f, " OVER ({})", spec)?;
                }
                Ok(())
            }
            Expr::BinaryOp { left, op, right } => {
                let prec = precedence(self);
                write_operand(f, left, prec)?;
                write!(f, " {} ", op.symbol())?;
                // Left-associative: equal-precedence right operands need parens.
                write_operand(f, right, prec + 1)
            }
            Expr::UnaryOp { op, expr } => match op {
                UnaryOperator::Not => {
                    write!(f, "NOT ")?;
                    write_operand(f, expr, 3)
                }
                UnaryOperator::Plus => {
                    write!(f, "+")?;
                    write_operand(f, expr, 7)
                }
                UnaryOperator::Minus => {
                    write!(f, "-")?;
                    write_operand(f, expr, 7)
                }
            },
            Expr::Case {
                operand,
                branches,
                else_arm
            } => {
                write!(f, "CASE")?;
                if let Some(op) = operand {
                    write!(f, " {}", op)?;
                }
                for CaseBranch { when, then } in branches {
                    write!(f, " WHEN {} THEN {}", when, then)?;
                }
                if let Some(e) = else_arm {
                    write!(f, " ELSE {}", e)?;
                }
                write!(f, " END")
            }
            Expr::Tuple(items) => {
                write!(f, "(")?;
                let mut first = true;
                for item in items {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expr::Array(items) => {
                write!(f, "[")?;
                let mut first = true;
                for item in items {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expr::Interval { value, unit } => {
                write!(f, "INTERVAL ")?;
                write_operand(f, value, 7)?;
                write!(f, " {}", unit.to_uppercase())
            }
            Expr::Between {
                expr,
                negated,
                low,
                high
            } => {
                write_operand(f, expr, 5)?;
                if *negated {
                    write!(f, " NOT")?;
                }
                write!(f, " BETWEEN ")?;
                write_operand(f, low, 5)?;
                write!(f, " AND ")?;
                write_operand(f, high, 5)
            }
            Expr::InList {
                expr,
                negated,
                list
            } => {
                write_operand(f, expr, 5)?;
                if *negated {
                    write!(f, " NOT")?;
                }
                write!(f, " IN (")?;
                let mut first = true;
                for item in list {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expr::IsNull { expr, negated } => {
                write_operand(f, expr, 5)?;
                if *negated {
                    write!(f, " IS NOT NULL")
                } else {
                    write!(f, " IS NULL")
                }
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(text) => write!(f, "{}", text),
            Literal::String(text) => write!(f, "'{}'", escape_string(text)),
            Literal::Null => write!(f, "NULL")
        }
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeParam::Number(text) => write!(f, "{}", text),
            TypeParam::String(text) => write!(f, "'{}'", escape_string(text)),
            TypeParam::Ident(name) => write!(f, "{}", name),
            TypeParam::EnumValue { name, value } => {
                write!(f, "'{}'", escape_string(name))?;
                if let Some(v) = value {
                    write!(f, " = {}", v)?;
                }
                Ok(())
            }
            TypeParam::Function { name, params } => {
                write!(f, "{}(", name)?;
                let mut first = true;
                for param in params {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{}", param)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Simple { name, params } => {
                write!(f, "{}", name)?;
                if !params.is_empty() {
                    write!(f, "(")?;
                    let mut first = true;
                    for param in params {
                        if !first {
                            write!(f, ", ")?;
                        }
                        first = false;
                        write!(f, "{}", param)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            DataType::Nullable(inner) => write!(f, "Nullable({})", inner),
            DataType::Array(inner) => write!(f, "Array({})", inner),
            DataType::Tuple(elements) => {
                write!(f, "Tuple(")?;
                let mut first = true;
                for element in elements {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    if let Some(name) = &element.name {
                        write!(f, "`{}` ", name)?;
                    }
                    write!(f, "{}", element.data_type)?;
                }
                write!(f, ")")
            }
            DataType::Map(key, value) => write!(f, "Map({}, {})", key, value),
            DataType::LowCardinality(inner) => write!(f, "LowCardinality({})", inner),
            DataType::Nested(columns) => {
                write!(f, "Nested(")?;
                let mut first = true;
                for column in columns {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "`{}` {}", column.name, column.data_type)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CODEC(")?;
        let mut first = true;
        for spec in &self.specs {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}", spec.name)?;
            if !spec.params.is_empty() {
                write!(f, "(")?;
                let mut inner_first = true;
                for param in &spec.params {
                    if !inner_first {
                        write!(f, ", ")?;
                    }
                    inner_first = false;
                    write!(f, "{}", param)?;
                }
                write!(f, ")")?;
            }
        }
        write!(f, ")")
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.name, self.data_type)?;
        if let Some(ColumnDefault { kind, expr }) = &self.default {
            write!(f, " {}", kind.keyword())?;
            if let Some(e) = expr {
                write!(f, " {}", e)?;
            }
        }
        if let Some(codec) = &self.codec {
            write!(f, " {}", codec)?;
        }
        if let Some(ttl) = &self.ttl {
            write!(f, " TTL {}", ttl)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " COMMENT '{}'", escape_string(comment))?;
        }
        Ok(())
    }
}

impl fmt::Display for TableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INDEX `{}` {} TYPE {}", self.name, self.expr, self.index_type)?;
        if !self.type_params.is_empty() {
            write!(f, "(")?;
            let mut first = true;
            for param in &self.type_params {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{}", param)?;
            }
            write!(f, ")")?;
        }
        if let Some(g) = self.granularity {
            write!(f, " GRANULARITY {}", g)?;
        }
        Ok(())
    }
}

impl fmt::Display for TableConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kw = if self.assume { "ASSUME" } else { "CHECK" };
        write!(f, "CONSTRAINT `{}` {} {}", self.name, kw, self.expr)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut first = true;
        for param in &self.params {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for CreateDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE DATABASE ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write!(f, "`{}`", self.name)?;
        write_cluster(f, &self.cluster)?;
        if let Some(engine) = &self.engine {
            write!(f, " ENGINE = {}", engine)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " COMMENT '{}'", escape_string(comment))?;
        }
        Ok(())
    }
}

impl fmt::Display for CreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE ")?;
        if self.or_replace {
            write!(f, "OR REPLACE ")?;
        }
        write!(f, "TABLE ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write_qualified(f, &self.name)?;
        write_cluster(f, &self.cluster)?;
        writeln!(f, "\n(")?;
        let mut first = true;
        for column in &self.columns {
            if !first {
                writeln!(f, ",")?;
            }
            first = false;
            write!(f, "    {}", column)?;
        }
        for index in &self.indexes {
            if !first {
                writeln!(f, ",")?;
            }
            first = false;
            write!(f, "    {}", index)?;
        }
        for constraint in &self.constraints {
            if !first {
                writeln!(f, ",")?;
            }
            first = false;
            write!(f, "    {}", constraint)?;
        }
        for projection in &self.projections {
            if !first {
                writeln!(f, ",")?;
            }
            first = false;
            write!(f, "    PROJECTION `{}` ({})", projection.name, projection.query)?;
        }
        write!(f, "\n)")?;
        write!(f, "\nENGINE = {}", self.engine)?;
        if let Some(expr) = &self.partition_by {
            write!(f, "\nPARTITION BY {}", expr)?;
        }
        if let Some(expr) = &self.primary_key {
            write!(f, "\nPRIMARY KEY {}", expr)?;
        }
        if let Some(expr) = &self.order_by {
            write!(f, "\nORDER BY {}", expr)?;
        }
        if let Some(expr) = &self.sample_by {
            write!(f, "\nSAMPLE BY {}", expr)?;
        }
        if let Some(expr) = &self.ttl {
            write!(f, "\nTTL {}", expr)?;
        }
        if !self.settings.is_empty() {
            write!(f, "\nSETTINGS ")?;
            write_settings(f, &self.settings)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, "\nCOMMENT '{}'", escape_string(comment))?;
        }
        Ok(())
    }
}

impl fmt::Display for CreateDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE ")?;
        if self.or_replace {
            write!(f, "OR REPLACE ")?;
        }
        write!(f, "DICTIONARY ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write_qualified(f, &self.name)?;
        write_cluster(f, &self.cluster)?;
        writeln!(f, "\n(")?;
        let mut first = true;
        for column in &self.columns {
            if !first {
                writeln!(f, ",")?;
            }
            first = false;
            write!(f, "    `{}` {}", column.name, column.data_type)?;
            if let Some(d) = &column.default {
                write!(f, " DEFAULT {}", d)?;
            }
            if let Some(e) = &column.expression {
                write!(f, " EXPRESSION {}", e)?;
            }
            if column.hierarchical {
                write!(f, " HIERARCHICAL")?;
            }
            if column.injective {
                write!(f, " INJECTIVE")?;
            }
            if column.is_object_id {
                write!(f, " IS_OBJECT_ID")?;
            }
        }
        write!(f, "\n)")?;
        if !self.primary_key.is_empty() {
            write!(f, "\nPRIMARY KEY ")?;
            let mut first = true;
            for key in &self.primary_key {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "`{}`", key)?;
            }
        }
        if let Some(source) = &self.source {
            write!(f, "\nSOURCE({}(", source.name)?;
            let mut first = true;
            for (key, value) in &source.params {
                if !first {
                    write!(f, " ")?;
                }
                first = false;
                write!(f, "{} {}", key, value)?;
            }
            write!(f, "))")?;
        }
        if let Some(layout) = &self.layout {
            write!(f, "\nLAYOUT({}(", layout.name)?;
            let mut first = true;
            for (key, value) in &layout.params {
                if !first {
                    write!(f, " ")?;
                }
                first = false;
                write!(f, "{} {}", key, value)?;
            }
            write!(f, "))")?;
        }
        if let Some(lifetime) = &self.lifetime {
            match lifetime {
                DictionaryLifetime::Single(n) => write!(f, "\nLIFETIME({})", n)?,
                DictionaryLifetime::MinMax { min, max } => {
                    write!(f, "\nLIFETIME(MIN {} MAX {})", min, max)?;
                }
            }
        }
        if !self.settings.is_empty() {
            write!(f, "\nSETTINGS(")?;
            write_settings(f, &self.settings)?;
            write!(f, ")")?;
        }
        if let Some(comment) = &self.comment {
            write!(f, "\nCOMMENT '{}'", escape_string(comment))?;
        }
        Ok(())
    }
}

impl fmt::Display for CreateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE ")?;
        if self.or_replace {
            write!(f, "OR REPLACE ")?;
        }
        if self.materialized {
            write!(f, "MATERIALIZED ")?;
        }
        write!(f, "VIEW ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write_qualified(f, &self.name)?;
        write_cluster(f, &self.cluster)?;
        if let Some(to) = &self.to {
            write!(f, " TO ")?;
            write_qualified(f, to)?;
        }
        if let Some(engine) = &self.engine {
            write!(f, "\nENGINE = {}", engine)?;
        }
        if let Some(expr) = &self.partition_by {
            write!(f, "\nPARTITION BY {}", expr)?;
        }
        if let Some(expr) = &self.order_by {
            write!(f, "\nORDER BY {}", expr)?;
        }
        if !self.settings.is_empty() {
            write!(f, "\nSETTINGS ")?;
            write_settings(f, &self.settings)?;
        }
        if self.populate {
            write!(f, "\nPOPULATE")?;
        }
        write!(f, "\nAS {}", self.query)?;
        if let Some(comment) = &self.comment {
            write!(f, "\nCOMMENT '{}'", escape_string(comment))?;
        }
        Ok(())
    }
}

impl fmt::Display for CollectionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.value)?;
        match self.overridable {
            Some(true) => write!(f, " OVERRIDABLE"),
            Some(false) => write!(f, " NOT OVERRIDABLE"),
            None => Ok(())
        }
    }
}

impl fmt::Display for CreateNamedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE NAMED COLLECTION ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write!(f, "`{}`", self.name)?;
        write_cluster(f, &self.cluster)?;
        write!(f, " AS")?;
        let mut first = true;
        for param in &self.params {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "\n    {}", param)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, "\nCOMMENT '{}'", escape_string(comment))?;
        }
        Ok(())
    }
}

impl fmt::Display for CreateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE ROLE ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write!(f, "`{}`", self.name)?;
        write_cluster(f, &self.cluster)?;
        if !self.settings.is_empty() {
            write!(f, " SETTINGS ")?;
            write_settings(f, &self.settings)?;
        }
        Ok(())
    }
}

impl fmt::Display for CreateUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE ")?;
        if self.or_replace {
            write!(f, "OR REPLACE ")?;
        }
        write!(f, "USER ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write!(f, "`{}`", self.name)?;
        write_cluster(f, &self.cluster)?;
        if let Some(id) = &self.identification {
            write!(f, " IDENTIFIED WITH {}", id.kind)?;
            if let Some(value) = &id.value {
                write!(f, " BY '{}'", escape_string(value))?;
            }
        }
        if !self.hosts.is_empty() {
            write!(f, " HOST ")?;
            let mut first = true;
            for host in &self.hosts {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{}", host.kind.keyword())?;
                if let Some(value) = &host.value {
                    write!(f, " '{}'", escape_string(value))?;
                }
            }
        }
        if let Some(roles) = &self.default_roles {
            write!(f, " DEFAULT ROLE ")?;
            if roles.is_empty() {
                write!(f, "ALL")?;
            } else {
                let mut first = true;
                for role in roles {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "`{}`", role)?;
                }
            }
        }
        if let Some(db) = &self.default_database {
            write!(f, " DEFAULT DATABASE `{}`", db)?;
        }
        if let Some(grantees) = &self.grantees {
            write!(f, " GRANTEES ")?;
            if grantees.is_empty() {
                write!(f, "ANY")?;
            } else {
                let mut first = true;
                for grantee in grantees {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "`{}`", grantee)?;
                }
            }
        }
        if !self.settings.is_empty() {
            write!(f, " SETTINGS ")?;
            write_settings(f, &self.settings)?;
        }
        Ok(())
    }
}

impl fmt::Display for CreateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE FUNCTION ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write!(f, "`{}`", self.name)?;
        write_cluster(f, &self.cluster)?;
        write!(f, " AS (")?;
        let mut first = true;
        for param in &self.params {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "`{}`", param)?;
        }
        write!(f, ") -> {}", self.body)
    }
}

fn write_privileges(f: &mut fmt::Formatter<'_>, privileges: &[Privilege]) -> fmt::Result {
    let mut first = true;
    for privilege in privileges {
        if !first {
            write!(f, ", ")?;
        }
        first = false;
        write!(f, "{}", privilege.name)?;
        if let Some(columns) = &privilege.columns {
            write!(f, "(")?;
            let mut inner_first = true;
            for column in columns {
                if !inner_first {
                    write!(f, ", ")?;
                }
                inner_first = false;
                write!(f, "`{}`", column)?;
            }
            write!(f, ")")?;
        }
    }
    Ok(())
}

impl fmt::Display for GrantTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "`{}`.", db)?,
            None => write!(f, "*.")?
        }
        match &self.table {
            Some(table) => write!(f, "`{}`", table),
            None => write!(f, "*")
        }
    }
}

impl fmt::Display for GrantStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GRANT")?;
        write_cluster(f, &self.cluster)?;
        write!(f, " ")?;
        write_privileges(f, &self.privileges)?;
        write!(f, " ON {} TO ", self.target)?;
        let mut first = true;
        for grantee in &self.grantees {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "`{}`", grantee)?;
        }
        if self.with_grant_option {
            write!(f, " WITH GRANT OPTION")?;
        }
        Ok(())
    }
}

impl fmt::Display for RevokeStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REVOKE")?;
        write_cluster(f, &self.cluster)?;
        write!(f, " ")?;
        write_privileges(f, &self.privileges)?;
        write!(f, " ON {} FROM ", self.target)?;
        let mut first = true;
        for grantee in &self.grantees {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "`{}`", grantee)?;
        }
        Ok(())
    }
}

impl fmt::Display for AlterDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER DATABASE `{}`", self.name)?;
        write_cluster(f, &self.cluster)?;
        write!(f, " MODIFY COMMENT '{}'", escape_string(&self.comment))
    }
}

impl fmt::Display for AlterTableOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlterTableOp::AddColumn {
                column,
                after,
                first
            } => {
                write!(f, "ADD COLUMN {}", column)?;
                if *first {
                    write!(f, " FIRST")?;
                } else if let Some(name) = after {
                    write!(f, " AFTER `{}`", name)?;
                }
                Ok(())
            }
            AlterTableOp::ModifyColumn { column } => write!(f, "MODIFY COLUMN {}", column),
            AlterTableOp::DropColumn { name } => write!(f, "DROP COLUMN `{}`", name),
            AlterTableOp::RenameColumn { from, to } => {
                write!(f, "RENAME COLUMN `{}` TO `{}`", from, to)
            }
            AlterTableOp::CommentColumn { name, comment } => {
                write!(f, "COMMENT COLUMN `{}` '{}'", name, escape_string(comment))
            }
            AlterTableOp::AddIndex { index } => write!(f, "ADD {}", index),
            AlterTableOp::DropIndex { name } => write!(f, "DROP INDEX `{}`", name),
            AlterTableOp::AddConstraint { constraint } => write!(f, "ADD {}", constraint),
            AlterTableOp::DropConstraint { name } => write!(f, "DROP CONSTRAINT `{}`", name),
            AlterTableOp::AddProjection { projection } => {
                write!(f, "ADD PROJECTION `{}` ({})", projection.name, projection.query)
            }
            AlterTableOp::DropProjection { name } => write!(f, "DROP PROJECTION `{}`", name),
            AlterTableOp::ModifyOrderBy { expr } => write!(f, "MODIFY ORDER BY {}", expr),
            AlterTableOp::ModifySampleBy { expr } => write!(f, "MODIFY SAMPLE BY {}", expr),
            AlterTableOp::ModifyTtl { expr } => write!(f, "MODIFY TTL {}", expr),
            AlterTableOp::RemoveTtl => write!(f, "REMOVE TTL"),
            AlterTableOp::ModifySetting { settings } => {
                write!(f, "MODIFY SETTING ")?;
                write_settings(f, settings)
            }
            AlterTableOp::ResetSetting { names } => {
                write!(f, "RESET SETTING ")?;
                let mut first = true;
                for name in names {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{}", name)?;
                }
                Ok(())
            }
            AlterTableOp::ModifyComment { comment } => {
                write!(f, "MODIFY COMMENT '{}'", escape_string(comment))
            }
        }
    }
}

impl fmt::Display for AlterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER TABLE ")?;
        write_qualified(f, &self.name)?;
        write_cluster(f, &self.cluster)?;
        write!(f, " ")?;
        let mut first = true;
        for op in &self.ops {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}

impl fmt::Display for AlterNamedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER NAMED COLLECTION `{}`", self.name)?;
        write_cluster(f, &self.cluster)?;
        for op in &self.ops {
            match op {
                CollectionAlterOp::Set(params) => {
                    write!(f, " SET ")?;
                    let mut first = true;
                    for param in params {
                        if !first {
                            write!(f, ", ")?;
                        }
                        first = false;
                        write!(f, "{}", param)?;
                    }
                }
                CollectionAlterOp::Delete(keys) => {
                    write!(f, " DELETE ")?;
                    let mut first = true;
                    for key in keys {
                        if !first {
                            write!(f, ", ")?;
                        }
                        first = false;
                        write!(f, "{}", key)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for AlterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER ROLE `{}`", self.name)?;
        write_cluster(f, &self.cluster)?;
        if let Some(to) = &self.rename_to {
            write!(f, " RENAME TO `{}`", to)?;
        }
        if let Some(settings) = &self.settings {
            write!(f, " SETTINGS ")?;
            write_settings(f, settings)?;
        }
        Ok(())
    }
}

impl fmt::Display for RenameDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RENAME DATABASE `{}` TO `{}`", self.from, self.to)?;
        write_cluster(f, &self.cluster)
    }
}

impl fmt::Display for RenameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dictionary {
            write!(f, "RENAME DICTIONARY ")?;
        } else {
            write!(f, "RENAME TABLE ")?;
        }
        let mut first = true;
        for (from, to) in &self.renames {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write_qualified(f, from)?;
            write!(f, " TO ")?;
            write_qualified(f, to)?;
        }
        write_cluster(f, &self.cluster)
    }
}

impl fmt::Display for DropObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DROP {} ", self.kind.keyword())?;
        if self.if_exists {
            write!(f, "IF EXISTS ")?;
        }
        write_qualified(f, &self.name)?;
        write_cluster(f, &self.cluster)
    }
}

impl fmt::Display for RawStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::CreateDatabase(s) => write!(f, "{}", s),
            Statement::CreateTable(s) => write!(f, "{}", s),
            Statement::CreateDictionary(s) => write!(f, "{}", s),
            Statement::CreateView(s) => write!(f, "{}", s),
            Statement::CreateNamedCollection(s) => write!(f, "{}", s),
            Statement::CreateRole(s) => write!(f, "{}", s),
            Statement::CreateUser(s) => write!(f, "{}", s),
            Statement::CreateFunction(s) => write!(f, "{}", s),
            Statement::Grant(s) => write!(f, "{}", s),
            Statement::Revoke(s) => write!(f, "{}", s),
            Statement::AlterDatabase(s) => write!(f, "{}", s),
            Statement::AlterTable(s) => write!(f, "{}", s),
            Statement::AlterNamedCollection(s) => write!(f, "{}", s),
            Statement::AlterRole(s) => write!(f, "{}", s),
            Statement::RenameDatabase(s) => write!(f, "{}", s),
            Statement::RenameTable(s) => write!(f, "{}", s),
            Statement::Drop(s) => write!(f, "{}", s),
            Statement::Raw(s) => write!(f, "{}", s)
        }
    }
}

fn write_comment(out: &mut String, comment: &str) {
    if comment.contains('\n') {
        let _ = writeln!(out, "/* {} */", comment);
    } else {
        let _ = writeln!(out, "-- {}", comment);
    }
}

/// Render one statement with its attached comments and terminating `;`.
pub fn render_statement(statement: &Statement) -> String {
    let mut out = String::new();
    let commented = statement.commented();
    for comment in commented.leading_comments() {
        write_comment(&mut out, comment);
    }
    let _ = write!(out, "{}", statement);
    if commented.trailing_comments().is_empty() {
        out.push_str(";\n");
    } else {
        out.push('\n');
        for comment in commented.trailing_comments() {
            write_comment(&mut out, comment);
        }
        out.push_str(";\n");
    }
    out
}

/// Render a stream of statements separated by blank lines.
pub fn render_statements(statements: &[Statement]) -> String {
    let mut out = String::new();
    for (i, statement) in statements.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&render_statement(statement));
    }
    out
}

/// Statement body without attached comments; the input to rename-detection
/// shape keys and other semantic comparisons.
pub fn canonical_body(statement: &Statement) -> String {
    statement.to_string()
}

#[cfg(test)]
mod tests {
    use crate::ast::{Column, CreateTable, DataType, Engine, Expr, QualifiedName, Statement};

    use super::*;

    #[test]
    fn quotes_all_identifiers() {
        let mut table = CreateTable::new(
            QualifiedName::qualified("app", "users"),
            Engine::named("MergeTree")
        );
        table.columns.push(Column::new("id", DataType::simple("UInt64")));
        table.order_by = Some(Expr::ident("id"));
        let sql = Statement::CreateTable(table).to_string();
        assert!(sql.contains("`app`.`users`"));
        assert!(sql.contains("`id` UInt64"));
        assert!(sql.contains("ORDER BY `id`"));
        assert!(sql.contains("ENGINE = MergeTree()"));
    }

    #[test]
    fn binary_op_parens_are_minimal() {
        let expr = Expr::BinaryOp {
            left:  Box::new(Expr::ident("a")),
            op:    crate::ast::BinaryOperator::Multiply,
            right: Box::new(Expr::BinaryOp {
                left:  Box::new(Expr::ident("b")),
                op:    crate::ast::BinaryOperator::Plus,
                right: Box::new(Expr::ident("c"))
            })
        };
        assert_eq!(expr.to_string(), "`a` * (`b` + `c`)");

        let expr = Expr::BinaryOp {
            left:  Box::new(Expr::ident("a")),
            op:    crate::ast::BinaryOperator::Plus,
            right: Box::new(Expr::BinaryOp {
                left:  Box::new(Expr::ident("b")),
                op:    crate::ast::BinaryOperator::Multiply,
                right: Box::new(Expr::ident("c"))
            })
        };
        assert_eq!(expr.to_string(), "`a` + `b` * `c`");
    }

    #[test]
    fn string_escaping_round_trips_through_lexer() {
        let rendered = Literal::String("it's\na \\ test".to_string()).to_string();
        let tokens = crate::lexer::tokenize(&rendered).unwrap();
        assert_eq!(tokens[0].text, "it's\na \\ test");
    }

    #[test]
    fn render_statement_places_comments() {
        let mut db = crate::ast::CreateDatabase::new("analytics");
        db.leading_comments.push("main database".to_string());
        db.trailing_comments.push("end".to_string());
        let text = render_statement(&Statement::CreateDatabase(db));
        assert!(text.starts_with("-- main database\n"));
        assert!(text.contains("\n-- end\n;\n"));
    }
}
