//! Lenient parsing of stored configuration documents.

use crate::types::ConfigRow;
use serde_json::{Map, Value};

/// Parse a row's stored document, treating undecodable bytes as malformed.
pub fn parse_row_source(row: &ConfigRow) -> Result<Map<String, Value>, String> {
    match &row.decode_error {
        Some(reason) => Err(reason.clone()),
        None => parse_source(row.source.as_deref()),
    }
}

/// Parse a stored `source` column into a nested mapping.
///
/// JSON is tried first, then YAML. A missing, blank, or `null` document is an
/// absent document and parses to an empty mapping. Only unparsable text or a
/// document whose top level is not a mapping is rejected; the error string
/// describes why.
pub fn parse_source(raw: Option<&str>) -> Result<Map<String, Value>, String> {
    let text = match raw.map(str::trim) {
        None | Some("") => return Ok(Map::new()),
        Some(text) => text,
    };

    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(json_err) => match serde_yaml::from_str::<Value>(text) {
            Ok(value) => value,
            Err(yaml_err) => {
                return Err(format!(
                    "not valid JSON ({}) or YAML ({})",
                    json_err, yaml_err
                ));
            }
        },
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(format!(
            "expected a mapping at the top level, found {}",
            kind_of(&other)
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_json_object() {
        let map = parse_source(Some(r#"{"x": 1, "nested": {"y": "z"}}"#)).unwrap();
        assert_eq!(Value::Object(map), json!({"x": 1, "nested": {"y": "z"}}));
    }

    #[test]
    fn parses_yaml_mapping() {
        let yaml = "server:\n  port: 8080\n  hosts:\n    - a\n    - b\n";
        let map = parse_source(Some(yaml)).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({"server": {"port": 8080, "hosts": ["a", "b"]}})
        );
    }

    #[test]
    fn absent_documents_are_empty() {
        assert!(parse_source(None).unwrap().is_empty());
        assert!(parse_source(Some("")).unwrap().is_empty());
        assert!(parse_source(Some("  \n ")).unwrap().is_empty());
        assert!(parse_source(Some("null")).unwrap().is_empty());
    }

    #[test]
    fn unparsable_text_is_rejected() {
        let err = parse_source(Some(r#"{"x": "#)).unwrap_err();
        assert!(err.contains("not valid JSON"), "unexpected error: {}", err);
    }

    #[test]
    fn non_mapping_top_level_is_rejected() {
        let err = parse_source(Some("[1, 2]")).unwrap_err();
        assert!(err.contains("a sequence"), "unexpected error: {}", err);

        let err = parse_source(Some("just words")).unwrap_err();
        assert!(err.contains("a string"), "unexpected error: {}", err);
    }

    #[test]
    fn large_integers_keep_every_digit() {
        let map = parse_source(Some(r#"{"id": 123456789012345678901234, "ratio": 0.1}"#)).unwrap();
        assert_eq!(map["id"].to_string(), "123456789012345678901234");
        assert_eq!(map["ratio"].to_string(), "0.1");
    }

    #[test]
    fn undecodable_row_is_rejected() {
        let row = ConfigRow::undecodable(None, None, "source is not valid UTF-8");
        assert_eq!(parse_row_source(&row).unwrap_err(), "source is not valid UTF-8");

        let row = ConfigRow::new(None, None, r#"{"x": 1}"#);
        assert_eq!(parse_row_source(&row).unwrap().len(), 1);
    }

    #[test]
    fn json_key_order_is_kept() {
        let map = parse_source(Some(r#"{"b": 1, "a": 2, "c": 3}"#)).unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
