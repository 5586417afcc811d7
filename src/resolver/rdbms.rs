//! Environment source backed by a relational table of configuration rows.

use super::{EnvironmentSource, MalformedSourcePolicy, ResolveRequest, assemble_environment};
use crate::db::{RowQuery, RowStore, TableName};
use crate::error::ResolutionError;
use crate::types::Environment;
use std::time::Instant;
use tracing::{debug, info};

/// Where the rows for an application live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStrategy {
    /// All applications share one table.
    Shared(TableName),
    /// Each application has a table named after it.
    PerApplication,
}

impl TableStrategy {
    fn table_for(&self, application: &str) -> Result<TableName, ResolutionError> {
        match self {
            TableStrategy::Shared(table) => Ok(table.clone()),
            TableStrategy::PerApplication => TableName::new(application).map_err(|_| {
                ResolutionError::InvalidRequest(format!(
                    "application name {:?} is not a valid table name",
                    application
                ))
            }),
        }
    }
}

/// Resolves environments with one parameterized query per request.
pub struct RdbmsEnvironmentSource<S> {
    store: S,
    tables: TableStrategy,
    policy: MalformedSourcePolicy,
}

impl<S: RowStore> RdbmsEnvironmentSource<S> {
    pub fn new(store: S, table: TableName) -> Self {
        Self::with_tables(store, TableStrategy::Shared(table))
    }

    pub fn with_tables(store: S, tables: TableStrategy) -> Self {
        Self {
            store,
            tables,
            policy: MalformedSourcePolicy::default(),
        }
    }

    pub fn with_table_strategy(mut self, tables: TableStrategy) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_policy(mut self, policy: MalformedSourcePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: RowStore> EnvironmentSource for RdbmsEnvironmentSource<S> {
    fn resolve(
        &self,
        name: &str,
        profile: &str,
        label: Option<&str>,
    ) -> Result<Environment, ResolutionError> {
        let start = Instant::now();
        let request = ResolveRequest::new(name, profile, label)?;
        let table = self.tables.table_for(&request.name)?;

        let query = RowQuery::new(
            table,
            request.profile_axis.clone(),
            request.label_axis.clone(),
        );
        let rows = self.store.find_rows(&query)?;
        debug!(
            application = %request.name,
            table = %query.table(),
            rows = rows.len(),
            "Fetched configuration rows"
        );

        let environment = assemble_environment(&request, rows, self.policy)?;
        info!(
            application = %environment.name,
            profiles = ?environment.profiles,
            label = ?environment.label,
            sources = environment.property_sources.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resolved environment"
        );
        Ok(environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::types::ConfigRow;
    use std::sync::Mutex;

    /// Records every query it receives and serves a fixed row set.
    struct RecordingStore {
        rows: Vec<ConfigRow>,
        seen: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl RecordingStore {
        fn new(rows: Vec<ConfigRow>) -> Self {
            Self {
                rows,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl RowStore for RecordingStore {
        fn find_rows(&self, query: &RowQuery) -> Result<Vec<ConfigRow>, StoreError> {
            self.seen
                .lock()
                .unwrap()
                .push((query.sql(), query.params()));
            Ok(self.rows.clone())
        }
    }

    struct FailingStore;

    impl RowStore for FailingStore {
        fn find_rows(&self, _query: &RowQuery) -> Result<Vec<ConfigRow>, StoreError> {
            Err(StoreError::Timeout("database is locked".to_string()))
        }
    }

    fn table() -> TableName {
        TableName::new("config").unwrap()
    }

    #[test]
    fn hostile_profile_is_passed_as_parameter() {
        let source = RdbmsEnvironmentSource::new(RecordingStore::new(vec![]), table());

        source.resolve("app", "' OR '1'='1", Some("main")).unwrap();

        let seen = source.store().seen.lock().unwrap();
        let (sql, params) = &seen[0];
        assert!(!sql.contains("OR '1'"));
        assert_eq!(params, &vec!["' OR '1'='1".to_string(), "main".to_string()]);
    }

    #[test]
    fn store_failure_surfaces_as_data_access_error() {
        let source = RdbmsEnvironmentSource::new(FailingStore, table());

        let err = source.resolve("app", "prod", None).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::DataAccess(StoreError::Timeout(_))
        ));
    }

    #[test]
    fn per_application_strategy_queries_named_table() {
        let source = RdbmsEnvironmentSource::new(RecordingStore::new(vec![]), table())
            .with_table_strategy(TableStrategy::PerApplication);

        source.resolve("billing", "prod", None).unwrap();

        let seen = source.store().seen.lock().unwrap();
        assert!(seen[0].0.contains("FROM billing WHERE"));
    }

    #[test]
    fn per_application_strategy_rejects_unsafe_names() {
        let source = RdbmsEnvironmentSource::new(RecordingStore::new(vec![]), table())
            .with_table_strategy(TableStrategy::PerApplication);

        let err = source.resolve("app; DROP TABLE config", "", None).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidRequest(_)));
        assert!(source.store().seen.lock().unwrap().is_empty());
    }

    #[test]
    fn policy_is_applied_to_fetched_rows() {
        let rows = vec![ConfigRow::new(None, None, "{broken")];
        let source = RdbmsEnvironmentSource::new(RecordingStore::new(rows), table())
            .with_policy(MalformedSourcePolicy::Abort);

        let err = source.resolve("app", "", None).unwrap_err();
        assert!(matches!(err, ResolutionError::MalformedSource(_)));
    }
}
