//! SQLite-backed configuration row store.

pub mod rows;
pub mod schema;

pub use rows::{RowQuery, RowStore, TableName};
pub use schema::ColumnInfo;

use crate::error::StoreError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Connection settings for [`Database::open_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// How long a query waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Create the default `config` table if it is missing.
    pub run_migrations: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
            run_migrations: true,
        }
    }
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the database at the given path with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with(path, OpenOptions::default())
    }

    /// Open the database at the given path.
    pub fn open_with<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(StoreError::from_sqlite)?;
        conn.busy_timeout(options.busy_timeout)
            .map_err(StoreError::from_sqlite)?;

        // WAL lets the config table be edited externally while we read
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(StoreError::from_sqlite)?;

        Self::from_connection(conn, options)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::from_sqlite)?;
        Self::from_connection(conn, OpenOptions::default())
    }

    fn from_connection(conn: Connection, options: OpenOptions) -> Result<Self, StoreError> {
        conn.busy_timeout(options.busy_timeout)
            .map_err(StoreError::from_sqlite)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        if options.run_migrations {
            db.run_migrations()?;
        }

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            embedded::migrations::runner()
                .run(conn)
                .map_err(|e| StoreError::Migration(e.to_string()))?;
            Ok(())
        })
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
        f(&mut conn)
    }
}
