//! Check command: verify the configuration table and parse every row.

use crate::config::Config;
use crate::db::{ColumnInfo, Database, TableName};
use crate::error::StoreError;
use crate::format::OutputFormat;
use crate::resolver::{TableStrategy, parse_row_source};
use anyhow::{Result, anyhow, bail};
use clap::Args;
use serde::Serialize;
use std::process::ExitCode;
use tracing::{info, warn};

/// Arguments for the check command.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Application whose table to check (required with table_per_application)
    #[arg(short, long)]
    pub application: Option<String>,

    /// Output format: json or yaml
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

/// A stored row whose document cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRow {
    pub label: Option<String>,
    pub profile: Option<String>,
    pub reason: String,
}

/// Result of checking one table.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub rows: usize,
    pub malformed: Vec<MalformedRow>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }
}

/// Verify `table` and parse each stored document without resolving.
pub fn check_table(
    db: &Database,
    table: &TableName,
    verify_schema: bool,
) -> Result<CheckReport, StoreError> {
    if verify_schema {
        db.verify_config_table(table)?;
    }
    let columns = db.table_columns(table)?;
    let rows = db.scan_rows(table)?;

    let malformed: Vec<MalformedRow> = rows
        .iter()
        .filter_map(|row| {
            parse_row_source(row).err().map(|reason| MalformedRow {
                label: row.label.clone(),
                profile: row.profile.clone(),
                reason,
            })
        })
        .collect();

    for row in &malformed {
        warn!(
            table = %table,
            label = ?row.label,
            profile = ?row.profile,
            reason = %row.reason,
            "Malformed configuration row"
        );
    }

    Ok(CheckReport {
        table: table.to_string(),
        columns,
        rows: rows.len(),
        malformed,
    })
}

/// Pick the table to check from the configured strategy.
fn target_table(config: &Config, args: &CheckArgs) -> Result<TableName> {
    match config.store.table_strategy()? {
        TableStrategy::Shared(table) => Ok(table),
        TableStrategy::PerApplication => {
            let application = args
                .application
                .as_deref()
                .ok_or_else(|| anyhow!("--application is required with table_per_application"))?;
            Ok(TableName::new(application)?)
        }
    }
}

pub fn run_check(db: &Database, config: &Config, args: &CheckArgs) -> Result<ExitCode> {
    let table = target_table(config, args)?;
    let report = check_table(db, &table, config.store.verify_schema)?;

    let out = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Yaml => serde_yaml::to_string(&report)?,
        OutputFormat::Properties => bail!("check output supports json or yaml"),
    };
    println!("{}", out.trim_end());

    info!(
        table = %report.table,
        rows = report.rows,
        malformed = report.malformed.len(),
        "Checked configuration table"
    );

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
