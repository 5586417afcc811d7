//! Flattening of nested configuration documents into property paths.
//!
//! Object keys are joined with `.` and array elements get an `[index]`
//! suffix, so `{"a": {"b": 1, "c": [2, 3]}}` becomes `a.b=1`, `a.c[0]=2`,
//! `a.c[1]=3`. A null value or an empty array becomes the empty string; an
//! empty object contributes no keys. Flattening an already flat map returns
//! it unchanged.

use serde_json::{Map, Value};

/// Flatten a nested mapping into a single-level mapping of scalar values.
pub fn flatten(source: &Map<String, Value>) -> Map<String, Value> {
    let mut result = Map::new();
    flatten_into(&mut result, source, "");
    result
}

fn flatten_into(result: &mut Map<String, Value>, source: &Map<String, Value>, path: &str) {
    for (key, value) in source {
        let key = join_path(path, key);
        flatten_value(result, key, value);
    }
}

fn flatten_value(result: &mut Map<String, Value>, key: String, value: &Value) {
    match value {
        Value::Object(map) => flatten_into(result, map, &key),
        Value::Array(items) if items.is_empty() => {
            result.insert(key, Value::String(String::new()));
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(result, format!("{}[{}]", key, index), item);
            }
        }
        Value::Null => {
            result.insert(key, Value::String(String::new()));
        }
        scalar => {
            result.insert(key, scalar.clone());
        }
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else if key.starts_with('[') {
        format!("{}{}", path, key)
    } else {
        format!("{}.{}", path, key)
    }
}
