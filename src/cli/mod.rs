//! CLI command definitions for rdbms-config-server
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod check;
pub mod resolve;

use crate::config::Config;
use crate::db::Database;
use crate::resolver::RdbmsEnvironmentSource;
use anyhow::Result;
use check::CheckArgs;
use clap::{Parser, Subcommand};
use resolve::ResolveArgs;

/// Resolve layered configuration environments from a relational table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Configuration table name (overrides config)
    #[arg(short, long, global = true)]
    pub table: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the environment for an application, profiles and label
    Resolve(ResolveArgs),

    /// Print the merged view of a resolved environment
    Effective(ResolveArgs),

    /// Verify the configuration table and parse every stored row
    Check(CheckArgs),
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(db_path) = &self.database {
            config.store.db_path = db_path.into();
        }
        if let Some(table) = &self.table {
            config.store.table = table.clone();
            config.store.table_per_application = false;
        }
    }
}

/// Build the relational environment source described by `config`.
pub fn environment_source(
    db: Database,
    config: &Config,
) -> Result<RdbmsEnvironmentSource<Database>> {
    Ok(
        RdbmsEnvironmentSource::with_tables(db, config.store.table_strategy()?)
            .with_policy(config.resolver.malformed_source),
    )
}
