//! Field-by-field merging of configuration tiers.
//!
//! Higher tiers override lower tiers key by key. Arrays are replaced, not
//! concatenated, and an explicit `null` in a higher tier leaves the lower
//! tier's value in place.

use serde_json::Value;

/// Merge `overlay` onto `base`, with `overlay` taking precedence.
///
/// # Example
/// ```
/// use serde_json::json;
/// use rdbms_config_server::config::deep_merge;
///
/// let base = json!({"store": {"table": "config", "busy_timeout_ms": 5000}});
/// let overlay = json!({"store": {"table": "app_config"}});
/// let merged = deep_merge(base, overlay);
/// assert_eq!(
///     merged,
///     json!({"store": {"table": "app_config", "busy_timeout_ms": 5000}})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        // null means "not specified"
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold [`deep_merge`] over tiers given lowest priority first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
