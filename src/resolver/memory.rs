//! Environment source over rows held in memory.
//!
//! Useful for fixtures and for hosts that load configuration rows from
//! somewhere other than a SQL table.

use super::{EnvironmentSource, MalformedSourcePolicy, ResolveRequest, assemble_environment};
use crate::error::ResolutionError;
use crate::types::{ConfigRow, Environment};
use std::collections::HashMap;

/// Rows grouped by application name.
#[derive(Debug, Clone, Default)]
pub struct MemoryEnvironmentSource {
    applications: HashMap<String, Vec<ConfigRow>>,
    policy: MalformedSourcePolicy,
}

impl MemoryEnvironmentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows for an application, after any rows it already has.
    pub fn with_rows(mut self, application: impl Into<String>, rows: Vec<ConfigRow>) -> Self {
        self.applications
            .entry(application.into())
            .or_default()
            .extend(rows);
        self
    }

    pub fn with_policy(mut self, policy: MalformedSourcePolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl EnvironmentSource for MemoryEnvironmentSource {
    fn resolve(
        &self,
        name: &str,
        profile: &str,
        label: Option<&str>,
    ) -> Result<Environment, ResolutionError> {
        let request = ResolveRequest::new(name, profile, label)?;

        let rows: Vec<ConfigRow> = self
            .applications
            .get(&request.name)
            .map(|rows| rows.iter().filter(|r| request.accepts(r)).cloned().collect())
            .unwrap_or_default();

        assemble_environment(&request, rows, self.policy)
    }
}
