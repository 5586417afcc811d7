//! Configuration types.

use crate::db::{OpenOptions, TableName};
use crate::resolver::{MalformedSourcePolicy, TableStrategy};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Backing store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Table holding `label`, `profile` and `source` rows.
    #[serde(default = "default_table")]
    pub table: String,

    /// Use the application name as the table name instead of `table`.
    #[serde(default)]
    pub table_per_application: bool,

    /// How long a query waits on a locked database (default: 5000).
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Create the default table on open if it is missing.
    #[serde(default = "default_true")]
    pub run_migrations: bool,

    /// Check the table's columns before serving.
    #[serde(default = "default_true")]
    pub verify_schema: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            table: default_table(),
            table_per_application: false,
            busy_timeout_ms: default_busy_timeout_ms(),
            run_migrations: true,
            verify_schema: true,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("rdbms-config/config.db")
}

fn default_table() -> String {
    "config".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

impl StoreConfig {
    pub fn table_name(&self) -> Result<TableName> {
        Ok(TableName::new(&self.table)?)
    }

    pub fn table_strategy(&self) -> Result<TableStrategy> {
        if self.table_per_application {
            Ok(TableStrategy::PerApplication)
        } else {
            Ok(TableStrategy::Shared(self.table_name()?))
        }
    }

    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            run_migrations: self.run_migrations,
        }
    }
}

/// Resolution behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// What to do with rows whose stored document cannot be parsed.
    #[serde(default)]
    pub malformed_source: MalformedSourcePolicy,
}

impl Config {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings the store cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.store.table_per_application {
            TableName::new(&self.store.table)
                .map_err(|e| anyhow!("store.table: {}", e))?;
        }
        if self.store.busy_timeout_ms == 0 {
            return Err(anyhow!("store.busy_timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.store.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
