//! Project configuration.
//!
//! Loaded from `housekeeper.yaml` in the project directory, then overridden
//! by environment variables:
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `HOUSEKEEPER_URL` | ClickHouse HTTP endpoint |
//! | `HOUSEKEEPER_USER` | Username |
//! | `HOUSEKEEPER_PASSWORD` | Password |
//!
//! # File format
//!
//! ```yaml
//! clickhouse:
//!   url: http://localhost:8123
//!   username: default
//!   cluster: main
//!   timeout_secs: 60
//! schema: schema/main.sql
//! migrations: migrations
//! default_database: default
//! inject_cluster: true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, config_error};

pub const CONFIG_FILE: &str = "housekeeper.yaml";

/// Connection section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub url:          String,
    #[serde(default)]
    pub username:     Option<String>,
    #[serde(default)]
    pub password:     Option<String>,
    #[serde(default)]
    pub cluster:      Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url:          String::new(),
            username:     None,
            password:     None,
            cluster:      None,
            timeout_secs: default_timeout_secs()
        }
    }
}

/// Full project configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub clickhouse:       ConnectionConfig,
    /// Schema entrypoint: a `.sql` file (with imports) or a directory.
    #[serde(default = "default_schema")]
    pub schema:           PathBuf,
    #[serde(default = "default_migrations")]
    pub migrations:       PathBuf,
    #[serde(default = "default_database")]
    pub default_database: String,
    /// Inject `ON CLUSTER` into extracted statements when a cluster is
    /// configured. The server catalogs do not record the clause, so this
    /// defaults to on; disable it when schema files intentionally omit
    /// cluster designations.
    #[serde(default = "default_inject_cluster")]
    pub inject_cluster:   bool
}

fn default_schema() -> PathBuf {
    PathBuf::from("schema/main.sql")
}

fn default_migrations() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_database() -> String {
    "default".to_string()
}

fn default_inject_cluster() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clickhouse:       ConnectionConfig::default(),
            schema:           default_schema(),
            migrations:       default_migrations(),
            default_database: default_database(),
            inject_cluster:   default_inject_cluster()
        }
    }
}

impl Config {
    /// Load from a project directory and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Malformed YAML is a config error; a missing file yields defaults so
    /// `housekeeper fmt` and friends work without a project file.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let mut config = match fs::read_to_string(&path) {
            Ok(text) => serde_yaml::from_str::<Config>(&text)
                .map_err(|e| config_error(format!("{}: {}", path.display(), e)))?,
            Err(_) => Config::default()
        };
        config.schema = dir.join(&config.schema);
        config.migrations = dir.join(&config.migrations);
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = env::var("HOUSEKEEPER_URL") {
            self.clickhouse.url = url;
        }
        if let Ok(user) = env::var("HOUSEKEEPER_USER") {
            self.clickhouse.username = Some(user);
        }
        if let Ok(password) = env::var("HOUSEKEEPER_PASSWORD") {
            self.clickhouse.password = Some(password);
        }
    }

    /// The endpoint must be present before any server-facing command runs.
    pub fn require_endpoint(&self) -> Result<()> {
        if self.clickhouse.url.is_empty() {
            return Err(config_error(format!(
                "no clickhouse url configured; set clickhouse.url in {} or HOUSEKEEPER_URL",
                CONFIG_FILE
            )));
        }
        Ok(())
    }
}
