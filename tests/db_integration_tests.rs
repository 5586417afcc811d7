//! Integration tests for the database layer.
//!
//! These tests verify row lookup, schema checks and connection handling
//! using in-memory and on-disk SQLite databases.

use rdbms_config_server::db::{Database, OpenOptions, RowQuery, RowStore, TableName};
use rdbms_config_server::error::StoreError;
use rdbms_config_server::resolver::{Axis, label_axis, profile_axis, split_profiles};
use rdbms_config_server::types::ConfigRow;
use rusqlite::params;
use std::time::Duration;
use tempfile::TempDir;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn seed(db: &Database, rows: &[(Option<&str>, Option<&str>, &str)]) {
    db.with_conn(|conn| {
        for (label, profile, source) in rows {
            conn.execute(
                "INSERT INTO config (label, profile, source) VALUES (?1, ?2, ?3)",
                params![label, profile, source],
            )
            .map_err(StoreError::from_sqlite)?;
        }
        Ok(())
    })
    .expect("Failed to seed rows");
}

fn config_table() -> TableName {
    TableName::new("config").unwrap()
}

fn query(profiles: &str, label: Option<&str>) -> RowQuery {
    RowQuery::new(
        config_table(),
        profile_axis(&split_profiles(profiles)),
        label_axis(label),
    )
}

mod find_rows_tests {
    use super::*;

    #[test]
    fn returns_rows_on_both_axes() {
        let db = setup_db();
        seed(
            &db,
            &[
                (None, None, "{}"),
                (None, Some("prod"), "{}"),
                (Some("v1"), Some("prod"), "{}"),
                (Some("v2"), Some("prod"), "{}"),
                (None, Some("dev"), "{}"),
            ],
        );

        let rows = db.find_rows(&query("prod", Some("v1"))).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(
            rows.iter()
                .all(|r| r.label.as_deref() != Some("v2") && r.profile.as_deref() != Some("dev"))
        );
    }

    #[test]
    fn null_columns_round_trip_as_none() {
        let db = setup_db();
        seed(&db, &[(None, None, r#"{"a": 1}"#)]);

        let rows = db.find_rows(&query("default", None)).unwrap();
        assert_eq!(rows, vec![ConfigRow::new(None, None, r#"{"a": 1}"#)]);
    }

    #[test]
    fn empty_axes_match_nothing() {
        let db = setup_db();
        seed(&db, &[(None, None, "{}")]);

        let query = RowQuery::new(config_table(), Axis::default(), Axis::default());
        assert!(db.find_rows(&query).unwrap().is_empty());
    }

    #[test]
    fn blob_sources_are_read_as_text() {
        let db = setup_db();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO config (label, profile, source) VALUES (NULL, NULL, ?1)",
                params![b"{\"blob\": true}".to_vec()],
            )
            .map_err(StoreError::from_sqlite)?;
            Ok(())
        })
        .unwrap();

        let rows = db.find_rows(&query("default", None)).unwrap();
        assert_eq!(rows[0].source.as_deref(), Some("{\"blob\": true}"));
    }

    #[test]
    fn parameters_are_never_inlined() {
        let db = setup_db();
        seed(&db, &[(None, Some("secret"), "{}")]);

        let q = query("x' OR '1'='1", Some("y' OR '1'='1"));
        assert!(!q.sql().contains("OR '1'='1"));
        assert_eq!(q.params(), vec!["x' OR '1'='1", "y' OR '1'='1"]);
        assert!(db.find_rows(&q).unwrap().is_empty());
    }
}

mod scan_tests {
    use super::*;

    #[test]
    fn scan_returns_every_row() {
        let db = setup_db();
        seed(
            &db,
            &[
                (None, None, "{}"),
                (Some("v1"), Some("prod"), "not: [valid"),
            ],
        );

        let rows = db.scan_rows(&config_table()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn scan_of_missing_table_is_an_error() {
        let db = setup_db();
        let err = db.scan_rows(&TableName::new("absent").unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }
}

mod schema_tests {
    use super::*;

    #[test]
    fn migrated_table_has_required_columns() {
        let db = setup_db();
        db.verify_config_table(&config_table()).unwrap();

        let columns = db.table_columns(&config_table()).unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "label", "profile", "source"]);
        assert!(columns[0].primary_key);
        assert!(columns[1].nullable);
    }

    #[test]
    fn table_without_source_column_fails() {
        let db = setup_db();
        db.with_conn(|conn| {
            conn.execute_batch("CREATE TABLE partial (label TEXT, profile TEXT);")
                .map_err(StoreError::from_sqlite)
        })
        .unwrap();

        match db.verify_config_table(&TableName::new("partial").unwrap()) {
            Err(StoreError::MissingColumns { table, columns }) => {
                assert_eq!(table, "partial");
                assert_eq!(columns, vec!["source"]);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn invalid_table_names_are_rejected() {
        for name in ["", "1config", "config;", "con fig", "config--"] {
            assert!(
                matches!(TableName::new(name), Err(StoreError::InvalidTable(_))),
                "accepted {:?}",
                name
            );
        }
        assert!(TableName::new("_app_config2").is_ok());
    }
}

mod connection_tests {
    use super::*;

    #[test]
    fn file_database_persists_between_opens() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.db");

        {
            let db = Database::open(&path).unwrap();
            seed(&db, &[(None, Some("prod"), r#"{"kept": true}"#)]);
        }

        let db = Database::open(&path).unwrap();
        let rows = db.find_rows(&query("prod", None)).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn without_migrations_the_table_is_absent() {
        let temp = TempDir::new().unwrap();
        let options = OpenOptions {
            busy_timeout: Duration::from_millis(100),
            run_migrations: false,
        };
        let db = Database::open_with(temp.path().join("bare.db"), options).unwrap();

        assert!(db.table_columns(&config_table()).unwrap().is_empty());
        assert!(db.verify_config_table(&config_table()).is_err());
    }

    #[test]
    fn locked_file_surfaces_as_timeout() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("locked.db");

        let holder = rusqlite::Connection::open(&path).unwrap();
        holder
            .execute_batch(
                "CREATE TABLE config (label TEXT, profile TEXT, source TEXT);
                 BEGIN EXCLUSIVE;",
            )
            .unwrap();

        let options = OpenOptions {
            busy_timeout: Duration::from_millis(50),
            run_migrations: false,
        };
        match Database::open_with(&path, options) {
            Err(StoreError::Timeout(message)) => assert!(message.contains("locked")),
            Err(other) => panic!("expected a timeout, got {:?}", other),
            Ok(_) => panic!("opened a database held under an exclusive lock"),
        }

        holder.execute_batch("ROLLBACK;").unwrap();
    }
}
