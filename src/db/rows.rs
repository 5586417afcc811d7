//! Row lookup: the parameterized query that selects configuration rows on a
//! request's profile and label axes.

use super::Database;
use crate::error::StoreError;
use crate::resolver::Axis;
use crate::types::ConfigRow;
use rusqlite::types::ValueRef;
use std::fmt;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// A table name that is safe to splice into SQL text.
///
/// Identifiers cannot be bound as parameters, so only plain ASCII
/// identifiers are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: &str) -> Result<Self, StoreError> {
        if IDENTIFIER.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(StoreError::InvalidTable(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query for every row whose profile and label lie on the given axes.
///
/// Named axis values become positional `?` parameters. The default sentinel
/// becomes an `IS NULL` test, since `IN (NULL)` never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    table: TableName,
    profiles: Axis,
    labels: Axis,
}

impl RowQuery {
    pub fn new(table: TableName, profiles: Axis, labels: Axis) -> Self {
        Self {
            table,
            profiles,
            labels,
        }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// SQL text with `?` placeholders for every axis value.
    pub fn sql(&self) -> String {
        format!(
            "SELECT label, profile, source FROM {} WHERE {} AND {} ORDER BY label ASC, profile ASC",
            self.table,
            membership("profile", &self.profiles),
            membership("label", &self.labels),
        )
    }

    /// Bound parameters, in placeholder order.
    pub fn params(&self) -> Vec<String> {
        self.profiles
            .named()
            .chain(self.labels.named())
            .map(str::to_string)
            .collect()
    }
}

fn membership(column: &str, axis: &Axis) -> String {
    let named = axis.named().count();
    let mut clauses = Vec::new();

    if named > 0 {
        let placeholders: Vec<&str> = (0..named).map(|_| "?").collect();
        clauses.push(format!("{} IN ({})", column, placeholders.join(", ")));
    }
    if axis.includes_default() {
        clauses.push(format!("{} IS NULL", column));
    }

    match clauses.len() {
        0 => "0".to_string(),
        1 => clauses.remove(0),
        _ => format!("({})", clauses.join(" OR ")),
    }
}

/// Data-access capability the relational resolver depends on.
pub trait RowStore: Send + Sync {
    fn find_rows(&self, query: &RowQuery) -> Result<Vec<ConfigRow>, StoreError>;
}

impl RowStore for Database {
    fn find_rows(&self, query: &RowQuery) -> Result<Vec<ConfigRow>, StoreError> {
        let sql = query.sql();
        let params = query.params();

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(StoreError::from_sqlite)?;
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params.iter().map(|s| s as &dyn rusqlite::ToSql).collect();

            let rows = stmt
                .query_map(params_refs.as_slice(), read_row)
                .map_err(StoreError::from_sqlite)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from_sqlite)?;
            Ok(rows)
        })
    }
}

impl Database {
    /// Read every row of `table` in storage order.
    pub fn scan_rows(&self, table: &TableName) -> Result<Vec<ConfigRow>, StoreError> {
        let sql = format!("SELECT label, profile, source FROM {}", table);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(StoreError::from_sqlite)?;
            let rows = stmt
                .query_map([], read_row)
                .map_err(StoreError::from_sqlite)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from_sqlite)?;
            Ok(rows)
        })
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConfigRow> {
    let (source, decode_error) = match decode_source(row.get_ref(2)?) {
        Ok(source) => (source, None),
        Err(reason) => (None, Some(reason)),
    };
    Ok(ConfigRow {
        label: row.get(0)?,
        profile: row.get(1)?,
        source,
        decode_error,
    })
}

/// Stored documents may be TEXT or BLOB; numbers are kept as their text form.
/// Bytes that are not UTF-8 are reported rather than repaired.
fn decode_source(value: ValueRef<'_>) -> Result<Option<String>, String> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => std::str::from_utf8(bytes)
            .map(|text| Some(text.to_string()))
            .map_err(|e| format!("source is not valid UTF-8: {}", e)),
        ValueRef::Integer(i) => Ok(Some(i.to_string())),
        ValueRef::Real(f) => Ok(Some(f.to_string())),
    }
}
