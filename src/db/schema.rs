//! Schema introspection for the configuration table.

use super::{Database, TableName};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// Columns every configuration table must provide.
pub const REQUIRED_COLUMNS: [&str; 3] = ["label", "profile", "source"];

/// Information about a table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

impl Database {
    /// Columns of `table`, empty if the table does not exist.
    pub fn table_columns(&self, table: &TableName) -> Result<Vec<ColumnInfo>, StoreError> {
        let sql = format!("PRAGMA table_info({})", table);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(StoreError::from_sqlite)?;
            let columns = stmt
                .query_map([], |row| {
                    let not_null: i32 = row.get(3)?;
                    let pk: i32 = row.get(5)?;
                    Ok(ColumnInfo {
                        name: row.get(1)?,
                        data_type: row.get(2)?,
                        nullable: not_null == 0,
                        primary_key: pk > 0,
                    })
                })
                .map_err(StoreError::from_sqlite)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from_sqlite)?;
            Ok(columns)
        })
    }

    /// Check that `table` exists and has the `label`, `profile` and `source`
    /// columns.
    pub fn verify_config_table(&self, table: &TableName) -> Result<(), StoreError> {
        let columns = self.table_columns(table)?;

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| {
                !columns
                    .iter()
                    .any(|c| c.name.eq_ignore_ascii_case(required))
            })
            .map(|c| c.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::MissingColumns {
                table: table.to_string(),
                columns: missing,
            })
        }
    }
}
