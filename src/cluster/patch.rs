//! Merge-style JSON patches (RFC 7386 shape).
//!
//! A patch carries every field whose desired value differs from the
//! existing one; a `null` removes a field. Fields absent from the patch
//! keep their server-side value, which is how server-assigned metadata
//! survives an update.

use serde_json::{Map, Value};

/// Computes the merge patch turning `existing` into `desired`.
pub fn diff_merge(existing: &Value, desired: &Value) -> Value {
    match (existing, desired) {
        (Value::Object(from), Value::Object(to)) => {
            let mut patch = Map::new();
            for (key, to_value) in to {
                match from.get(key) {
                    Some(from_value) if from_value == to_value => {}
                    Some(from_value) => {
                        patch.insert(key.clone(), diff_merge(from_value, to_value));
                    }
                    None => {
                        patch.insert(key.clone(), to_value.clone());
                    }
                }
            }
            for key in from.keys() {
                if !to.contains_key(key) {
                    patch.insert(key.clone(), Value::Null);
                }
            }
            Value::Object(patch)
        }
        _ => desired.clone(),
    }
}

/// Applies a merge patch in place.
pub fn apply_merge(target: &mut Value, patch: &Value) {
    match patch {
        Value::Object(entries) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(fields) = target {
                for (key, patch_value) in entries {
                    if patch_value.is_null() {
                        fields.remove(key);
                    } else {
                        apply_merge(
                            fields.entry(key.clone()).or_insert(Value::Null),
                            patch_value,
                        );
                    }
                }
            }
        }
        _ => *target = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_unchanged_fields_stay_out_of_the_patch() {
        let existing = json!({"name": "prod", "resource_version": "12", "ports": [80]});
        let desired = json!({"name": "prod", "resource_version": "12", "ports": [8080]});
        let patch = diff_merge(&existing, &desired);
        assert_eq!(patch, json!({"ports": [8080]}));
    }

    #[test]
    fn test_removed_field_becomes_null() {
        let existing = json!({"a": 1, "b": 2});
        let desired = json!({"a": 1});
        assert_eq!(diff_merge(&existing, &desired), json!({"b": null}));
    }

    #[test]
    fn test_apply_roundtrip() {
        let existing = json!({
            "name": "prod",
            "labels": {"team": "payments", "stale": "yes"},
            "ports": [{"name": "http", "port": 80}],
        });
        let desired = json!({
            "name": "prod",
            "labels": {"team": "payments"},
            "ports": [{"name": "http", "port": 8080}],
        });
        let patch = diff_merge(&existing, &desired);
        let mut patched = existing;
        apply_merge(&mut patched, &patch);
        assert_eq!(patched, desired);
    }

    #[test]
    fn test_scalar_replacement() {
        let mut target = json!({"count": 1});
        apply_merge(&mut target, &json!({"count": 2}));
        assert_eq!(target, json!({"count": 2}));
    }
}
