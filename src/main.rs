//! RDBMS Config Server
//!
//! Resolves layered configuration environments from rows stored in a
//! relational table and prints them for a host process.

use anyhow::Result;
use clap::Parser;
use rdbms_config_server::cli::check::run_check;
use rdbms_config_server::cli::resolve::{View, run_resolve};
use rdbms_config_server::cli::{Cli, Command, environment_source};
use rdbms_config_server::config::{Config, ConfigLoader, ConfigPaths};
use rdbms_config_server::db::Database;
use rdbms_config_server::logging::{self, LogTarget};
use rdbms_config_server::resolver::TableStrategy;
use std::process::ExitCode;
use tracing::{debug, info};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    // An explicit --config takes the place of RDBMS_CONFIG_PATH
    let explicit = cli.config.clone();
    let mut loader = ConfigLoader::load_with_env(ConfigPaths::discover(), |key| {
        if key == "RDBMS_CONFIG_PATH" && explicit.is_some() {
            return explicit.clone();
        }
        std::env::var(key).ok()
    })?;

    for (tier, path) in loader.sources() {
        debug!(tier = %tier, path = %path.display(), "Using config file");
    }

    cli.apply_overrides(loader.config_mut());
    let config = loader.into_config();
    config.validate()?;
    config.ensure_db_dir()?;

    let db = Database::open_with(&config.store.db_path, config.store.open_options())?;
    info!(path = %config.store.db_path.display(), "Opened configuration store");

    match &cli.command {
        Command::Resolve(args) => {
            verify_shared_table(&db, &config)?;
            let source = environment_source(db, &config)?;
            run_resolve(&source, args, View::Sources)
        }
        Command::Effective(args) => {
            verify_shared_table(&db, &config)?;
            let source = environment_source(db, &config)?;
            run_resolve(&source, args, View::Effective)
        }
        Command::Check(args) => run_check(&db, &config, args),
    }
}

/// Fail fast when the shared table lacks the required columns.
fn verify_shared_table(db: &Database, config: &Config) -> Result<()> {
    if config.store.verify_schema
        && let TableStrategy::Shared(table) = config.store.table_strategy()?
    {
        db.verify_config_table(&table)?;
    }
    Ok(())
}
