//! Canonical textual form for free-form JSON attribute maps.
//!
//! Two structurally-equal JSON values must serialize to byte-identical
//! strings regardless of how the original was typed by the caller. This
//! is load-bearing for supersession (§4.4: the signature is
//! `tool_name + "::" + canonical(tool_input)`) and for the store's
//! "byte-exact equality" invariant on attribute maps.

use serde_json::Value;

/// Recursively sorts object keys and re-serializes to a stable string.
///
/// Arrays keep their original order — position is meaningful there.
/// Only object key order is normalized.
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&sorted(value)).expect("canonical value always serializes")
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted_map = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted_map.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(sorted_map)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reorders_object_keys() {
        let a = canonical_json(&json!({"b": 1, "a": 2}));
        let b = canonical_json(&json!({"a": 2, "b": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn nested_objects_are_canonicalized() {
        let a = canonical_json(&json!({"outer": {"z": 1, "y": 2}}));
        let b = canonical_json(&json!({"outer": {"y": 2, "z": 1}}));
        assert_eq!(a, b);
    }

    #[test]
    fn array_order_is_preserved() {
        let a = canonical_json(&json!([1, 2, 3]));
        let b = canonical_json(&json!([3, 2, 1]));
        assert_ne!(a, b);
    }
}
