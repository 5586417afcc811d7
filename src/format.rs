//! Output formatting for resolved environments.

use crate::types::{Environment, PropertyMap};
use anyhow::Result;
use serde_json::Value;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Properties,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "properties" | "props" => Ok(OutputFormat::Properties),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: json, yaml, properties",
                s
            )),
        }
    }
}

/// Render a full environment.
///
/// The properties format writes each source as a `# name` header followed by
/// its `key=value` lines, highest priority first.
pub fn render_environment(env: &Environment, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(env)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(env)?),
        OutputFormat::Properties => {
            let mut out = String::new();
            for (index, source) in env.property_sources.iter().enumerate() {
                if index > 0 {
                    out.push('\n');
                }
                out.push_str(&format!("# {}\n", source.name));
                out.push_str(&render_properties(&source.source));
            }
            Ok(out)
        }
    }
}

/// Render a single flat map.
pub fn render_map(map: &PropertyMap, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(map)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(map)?),
        OutputFormat::Properties => Ok(render_properties(map)),
    }
}

/// `key=value` lines in map order.
pub fn render_properties(map: &PropertyMap) -> String {
    let mut out = String::new();
    for (key, value) in map {
        out.push_str(&escape_key(key));
        out.push('=');
        out.push_str(&escape_value(&scalar_text(value)));
        out.push('\n');
    }
    out
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '=' | ':' | ' ' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            _ => push_escaped(&mut out, c),
        }
    }
    out
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        _ => out.push(c),
    }
}
