//! Semantic differ: computes the ordered plan that transforms the current
//! schema into the target schema.
//!
//! Both inputs are statement streams (the current one usually extracted
//! from a live server, the target one compiled from schema files). Objects
//! are partitioned into per-class catalogs, each class applies its strategy
//! table, and the assembled plan is sorted by the ordering discipline of
//! [`plan::Plan::sort`].

pub mod access;
pub mod collection;
pub mod database;
pub mod dictionary;
pub mod function;
pub mod plan;
pub mod rename;
pub mod table;
pub mod view;

use indexmap::IndexMap;

use crate::ast::{CreateDatabase, CreateDictionary, CreateFunction, CreateNamedCollection,
                 CreateRole, CreateTable, CreateUser, CreateView, GrantStatement, Statement};
use crate::error::{Result, planning_error, validation_error};
use crate::format::render_statement;
use crate::parser::parse_single;

pub use plan::{ObjectCategory, Operation, OperationKind, Plan};

/// Namespaces the differ must never touch.
const PROTECTED_DATABASES: &[&str] = &["system", "information_schema", "INFORMATION_SCHEMA"];

#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Database assumed for unqualified object names.
    pub default_database: String
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            default_database: "default".to_string()
        }
    }
}

/// Per-class object catalogs keyed by resolved identity.
#[derive(Default)]
pub(crate) struct Catalog<'a> {
    pub databases:    IndexMap<String, &'a CreateDatabase>,
    pub tables:       IndexMap<String, &'a CreateTable>,
    pub dictionaries: IndexMap<String, &'a CreateDictionary>,
    pub views:        IndexMap<String, &'a CreateView>,
    pub collections:  IndexMap<String, &'a CreateNamedCollection>,
    pub roles:        IndexMap<String, &'a CreateRole>,
    pub users:        IndexMap<String, &'a CreateUser>,
    pub functions:    IndexMap<String, &'a CreateFunction>,
    pub grants:       IndexMap<String, &'a GrantStatement>
}

impl<'a> Catalog<'a> {
    fn build(statements: &'a [Statement], options: &DiffOptions) -> Result<Self> {
        let mut catalog = Catalog::default();
        for statement in statements {
            match statement {
                Statement::CreateDatabase(db) => {
                    insert_unique(&mut catalog.databases, db.name.to_string(), db, "database")?;
                }
                Statement::CreateTable(t) => {
                    let key = qualified_key(
                        t.name.database_or(&options.default_database),
                        &t.name.name
                    );
                    insert_unique(&mut catalog.tables, key, t, "table")?;
                }
                Statement::CreateDictionary(d) => {
                    let key = qualified_key(
                        d.name.database_or(&options.default_database),
                        &d.name.name
                    );
                    insert_unique(&mut catalog.dictionaries, key, d, "dictionary")?;
                }
                Statement::CreateView(v) => {
                    let key = qualified_key(
                        v.name.database_or(&options.default_database),
                        &v.name.name
                    );
                    insert_unique(&mut catalog.views, key, v, "view")?;
                }
                Statement::CreateNamedCollection(c) => {
                    insert_unique(
                        &mut catalog.collections,
                        c.name.to_string(),
                        c,
                        "named collection"
                    )?;
                }
                Statement::CreateRole(r) => {
                    insert_unique(&mut catalog.roles, r.name.to_string(), r, "role")?;
                }
                Statement::CreateUser(u) => {
                    insert_unique(&mut catalog.users, u.name.to_string(), u, "user")?;
                }
                Statement::CreateFunction(f) => {
                    insert_unique(&mut catalog.functions, f.name.to_string(), f, "function")?;
                }
                Statement::Grant(g) => {
                    catalog.grants.insert(access::grant_key(g), g);
                }
                // Raw statements and pre-rendered alterations carry no
                // declarative identity; they pass through undiffed.
                _ => {}
            }
        }
        Ok(catalog)
    }
}

fn qualified_key(database: &str, name: &str) -> String {
    format!("{}.{}", database, name)
}

fn insert_unique<'a, T>(
    map: &mut IndexMap<String, &'a T>,
    key: String,
    value: &'a T,
    class: &str
) -> Result<()> {
    if map.insert(key.clone(), value).is_some() {
        return Err(planning_error(format!("duplicate {} definition for {}", class, key)));
    }
    Ok(())
}

/// Fail when a planned change touches a protected namespace.
pub(crate) fn guard_namespace(database: &str, object: &str) -> Result<()> {
    if PROTECTED_DATABASES.contains(&database) {
        return Err(validation_error(format!(
            "refusing to modify {} inside protected namespace {}",
            object, database
        )));
    }
    Ok(())
}

/// Diff with default options.
pub fn diff(current: &[Statement], target: &[Statement]) -> Result<Plan> {
    diff_with_options(current, target, &DiffOptions::default())
}

/// Compute the ordered plan transforming `current` into `target`.
pub fn diff_with_options(
    current: &[Statement],
    target: &[Statement],
    options: &DiffOptions
) -> Result<Plan> {
    validate_round_trip(target)?;

    let current_catalog = Catalog::build(current, options)?;
    let target_catalog = Catalog::build(target, options)?;

    validate_database_references(&current_catalog, &target_catalog, options)?;

    let mut plan = Plan::default();
    database::diff_databases(&current_catalog, &target_catalog, &mut plan)?;
    collection::diff_collections(&current_catalog, &target_catalog, &mut plan)?;
    access::diff_roles(&current_catalog, &target_catalog, &mut plan)?;
    access::diff_users(&current_catalog, &target_catalog, &mut plan)?;
    access::diff_grants(&current_catalog, &target_catalog, &mut plan)?;
    table::diff_tables(&current_catalog, &target_catalog, options, &mut plan)?;
    dictionary::diff_dictionaries(&current_catalog, &target_catalog, &mut plan)?;
    view::diff_views(&current_catalog, &target_catalog, &mut plan)?;
    function::diff_functions(&current_catalog, &target_catalog, &mut plan)?;

    plan.sort();
    Ok(plan)
}

/// The target stream must survive a format/parse cycle unchanged before any
/// plan is derived from it.
fn validate_round_trip(target: &[Statement]) -> Result<()> {
    for statement in target {
        let rendered = render_statement(statement);
        let reparsed = parse_single(&rendered).map_err(|e| {
            validation_error(format!("target statement does not re-parse: {}", e))
        })?;
        if &reparsed != statement {
            return Err(validation_error(format!(
                "target statement does not round-trip: {}",
                rendered.lines().next().unwrap_or_default()
            )));
        }
    }
    Ok(())
}

/// Every database referenced by a qualified target name must exist in the
/// current schema or be created by this plan.
fn validate_database_references(
    current: &Catalog<'_>,
    target: &Catalog<'_>,
    options: &DiffOptions
) -> Result<()> {
    let known = |db: &str| {
        db == options.default_database
            || current.databases.contains_key(db)
            || target.databases.contains_key(db)
    };
    let check = |db: Option<&str>, object: String| -> Result<()> {
        if let Some(db) = db {
            if !PROTECTED_DATABASES.contains(&db) && !known(db) {
                return Err(validation_error(format!(
                    "{} references database {} which neither exists nor is created by the plan",
                    object, db
                )));
            }
        }
        Ok(())
    };
    for table in target.tables.values() {
        check(table.name.database.as_deref(), format!("table {}", table.name))?;
    }
    for dictionary in target.dictionaries.values() {
        check(
            dictionary.name.database.as_deref(),
            format!("dictionary {}", dictionary.name)
        )?;
    }
    for view in target.views.values() {
        check(view.name.database.as_deref(), format!("view {}", view.name))?;
    }
    Ok(())
}
