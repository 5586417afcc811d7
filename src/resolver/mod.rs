//! Environment resolution.
//!
//! A resolver turns an (application, profiles, label) request into an
//! [`Environment`]: it builds the profile and label axes, fetches the rows
//! that sit on both axes, parses and flattens each row's document, orders the
//! rows by axis rank and names the resulting property sources.
//!
//! The storage-specific part is only the row lookup. [`assemble_environment`]
//! is shared by every [`EnvironmentSource`] implementation.

pub mod axis;
pub mod flatten;
pub mod memory;
pub mod rdbms;
pub mod source;

pub use axis::{Axis, label_axis, normalize_label, profile_axis, split_profiles};
pub use flatten::flatten;
pub use memory::MemoryEnvironmentSource;
pub use rdbms::{RdbmsEnvironmentSource, TableStrategy};
pub use source::{parse_row_source, parse_source};

use crate::error::{MalformedSourceError, ResolutionError};
use crate::types::{ConfigRow, Environment, PropertySource};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A backend that can resolve environments.
pub trait EnvironmentSource: Send + Sync {
    /// Resolve the environment for `name`, a comma-delimited `profile` list,
    /// and an optional `label`.
    fn resolve(
        &self,
        name: &str,
        profile: &str,
        label: Option<&str>,
    ) -> Result<Environment, ResolutionError>;
}

/// What to do with a row whose stored document cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedSourcePolicy {
    /// Drop the row, log a warning, and keep resolving (default).
    #[default]
    Skip,
    /// Fail the whole request.
    Abort,
}

impl std::str::FromStr for MalformedSourcePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(MalformedSourcePolicy::Skip),
            "abort" => Ok(MalformedSourcePolicy::Abort),
            _ => Err(format!("Invalid policy '{}'. Valid options: skip, abort", s)),
        }
    }
}

/// A validated resolution request with its axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub name: String,
    pub profiles: Vec<String>,
    pub label: Option<String>,
    pub profile_axis: Axis,
    pub label_axis: Axis,
}

impl ResolveRequest {
    pub fn new(name: &str, profile: &str, label: Option<&str>) -> Result<Self, ResolutionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ResolutionError::InvalidRequest(
                "application name is required".to_string(),
            ));
        }

        let profiles = split_profiles(profile);
        let profile_axis = profile_axis(&profiles);
        let label = normalize_label(label);
        let label_axis = label_axis(label.as_deref());

        debug!(
            application = %name,
            profiles = ?profile_axis.values(),
            labels = ?label_axis.values(),
            "Built resolution axes"
        );

        Ok(Self {
            name: name.to_string(),
            profiles,
            label,
            profile_axis,
            label_axis,
        })
    }

    /// Whether a row lies on both axes of this request.
    pub fn accepts(&self, row: &ConfigRow) -> bool {
        self.profile_axis.contains(row.profile.as_deref())
            && self.label_axis.contains(row.label.as_deref())
    }
}

/// Property source name for a row: `{name}-{profile}` or
/// `{name}-{profile}-{label}`, with `default` standing in for a NULL profile.
pub fn source_name(name: &str, profile: Option<&str>, label: Option<&str>) -> String {
    let profile = profile.unwrap_or(axis::DEFAULT_PROFILE_NAME);
    match label {
        Some(label) => format!("{}-{}-{}", name, profile, label),
        None => format!("{}-{}", name, profile),
    }
}

/// Build the environment for `request` from the rows a store returned.
///
/// Rows are stably sorted by label rank and then profile rank; rows off an
/// axis sort last. Each row's document is parsed and flattened, and a
/// malformed document is handled according to `policy`.
pub fn assemble_environment(
    request: &ResolveRequest,
    mut rows: Vec<ConfigRow>,
    policy: MalformedSourcePolicy,
) -> Result<Environment, ResolutionError> {
    rows.sort_by_key(|row| {
        (
            request
                .label_axis
                .rank(row.label.as_deref())
                .unwrap_or(usize::MAX),
            request
                .profile_axis
                .rank(row.profile.as_deref())
                .unwrap_or(usize::MAX),
        )
    });

    let mut environment = Environment::new(
        request.name.clone(),
        request.profiles.clone(),
        request.label.clone(),
    );

    for row in rows {
        let nested = match parse_row_source(&row) {
            Ok(nested) => nested,
            Err(reason) => {
                let err = MalformedSourceError {
                    label: row.label.clone(),
                    profile: row.profile.clone(),
                    reason,
                };
                match policy {
                    MalformedSourcePolicy::Abort => return Err(err.into()),
                    MalformedSourcePolicy::Skip => {
                        warn!(
                            application = %request.name,
                            label = ?row.label,
                            profile = ?row.profile,
                            error = %err,
                            "Skipping row with malformed source"
                        );
                        continue;
                    }
                }
            }
        };

        let name = source_name(&request.name, row.profile.as_deref(), row.label.as_deref());
        environment.add(PropertySource::new(name, flatten(&nested)));
    }

    Ok(environment)
}
