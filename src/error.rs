//! Error types for environment resolution and the structured body reported at
//! the hosting boundary.

use serde::Serialize;
use thiserror::Error;

/// Failures raised by a row store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("store timed out: {0}")]
    Timeout(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid table name: {0:?}")]
    InvalidTable(String),

    #[error("table {table} is missing column(s): {}", .columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("migration failed: {0}")]
    Migration(String),
}

impl StoreError {
    /// Classify a rusqlite error, separating lock timeouts from other failures.
    pub fn from_sqlite(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                StoreError::Timeout(err.to_string())
            }
            _ => StoreError::Query(err),
        }
    }
}

/// A stored configuration document that could not be parsed.
#[derive(Debug, Clone, Error)]
#[error(
    "malformed source for label={} profile={}: {}",
    .label.as_deref().unwrap_or("<none>"),
    .profile.as_deref().unwrap_or("<none>"),
    .reason
)]
pub struct MalformedSourceError {
    pub label: Option<String>,
    pub profile: Option<String>,
    pub reason: String,
}

/// Failure to resolve an environment.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("cannot load environment: {0}")]
    DataAccess(#[from] StoreError),

    #[error(transparent)]
    MalformedSource(#[from] MalformedSourceError),
}

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    StoreTimeout,
    DatabaseError,
    MalformedSource,
}

/// Structured error reported to callers of the resolver.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&ResolutionError> for ErrorBody {
    fn from(err: &ResolutionError) -> Self {
        match err {
            ResolutionError::InvalidRequest(reason) => {
                ErrorBody::new(ErrorCode::InvalidRequest, reason.clone())
            }
            ResolutionError::DataAccess(StoreError::Timeout(details)) => {
                ErrorBody::new(ErrorCode::StoreTimeout, "Configuration store timed out")
                    .with_details(details.clone())
            }
            ResolutionError::DataAccess(store) => {
                ErrorBody::new(ErrorCode::DatabaseError, "Cannot load environment")
                    .with_details(store.to_string())
            }
            ResolutionError::MalformedSource(malformed) => {
                ErrorBody::new(ErrorCode::MalformedSource, malformed.to_string())
            }
        }
    }
}
