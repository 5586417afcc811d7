//! Core types for resolved configuration environments.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat key/value mapping held by a property source.
pub type PropertyMap = Map<String, Value>;

/// A stored configuration row as read from the backing table.
///
/// `None` in `label` or `profile` marks the default branch or default profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRow {
    pub label: Option<String>,
    pub profile: Option<String>,
    pub source: Option<String>,
    /// Set when the stored bytes were not valid UTF-8; `source` is then `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

impl ConfigRow {
    pub fn new(
        label: Option<&str>,
        profile: Option<&str>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            label: label.map(str::to_string),
            profile: profile.map(str::to_string),
            source: Some(source.into()),
            decode_error: None,
        }
    }

    /// A row whose stored document could not be decoded.
    pub fn undecodable(
        label: Option<&str>,
        profile: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            label: label.map(str::to_string),
            profile: profile.map(str::to_string),
            source: None,
            decode_error: Some(reason.into()),
        }
    }
}

/// A named, flattened layer of configuration properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySource {
    pub name: String,
    pub source: PropertyMap,
}

impl PropertySource {
    pub fn new(name: impl Into<String>, source: PropertyMap) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// The resolved configuration for one application/profile/label request.
///
/// Property sources are ordered from highest to lowest priority: the
/// requested label before the default branch, and within a label the
/// requested profiles in request order before the default profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub name: String,
    pub profiles: Vec<String>,
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub property_sources: Vec<PropertySource>,
}

impl Environment {
    pub fn new(name: impl Into<String>, profiles: Vec<String>, label: Option<String>) -> Self {
        Self {
            name: name.into(),
            profiles,
            label,
            version: None,
            state: None,
            property_sources: Vec::new(),
        }
    }

    /// Append a property source at the lowest priority.
    pub fn add(&mut self, source: PropertySource) {
        self.property_sources.push(source);
    }

    /// Collapse all property sources into one flat view.
    ///
    /// A key takes its value from the first (highest priority) source that
    /// defines it. Key order follows first appearance.
    pub fn effective_properties(&self) -> PropertyMap {
        let mut merged = PropertyMap::new();
        for source in &self.property_sources {
            for (key, value) in &source.source {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        merged
    }
}
