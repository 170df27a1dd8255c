//! JSON object helpers.

use serde_json::{Map, Value};

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value (arrays included)
/// replaces the base value. `Value::Null` in the overlay replaces too, so
/// callers can explicitly clear a key.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge a sequence of values left to right.
#[must_use]
pub fn deep_merge_all<I>(values: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    values
        .into_iter()
        .fold(Value::Object(Map::new()), deep_merge)
}

/// Walk a dotted path (`a.b.c`) through nested objects.
///
/// Empty paths and paths with empty segments (leading, trailing or double
/// dots) resolve to `None`. Array elements are addressed by index.
#[must_use]
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(value, |current, segment| {
        if segment.is_empty() {
            return None;
        }
        match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    })
}

/// Keep only the listed top-level keys of an object.
#[must_use]
pub fn pick(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Drop the listed top-level keys of an object.
#[must_use]
pub fn omit(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Flatten nested objects into `(dotted.path, leaf)` pairs.
#[must_use]
pub fn flatten_keys(value: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into(value, String::new(), &mut out);
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, path, out);
            }
        }
        leaf => out.push((prefix, leaf.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge_nested_objects() {
        let base = json!({"db": {"host": "localhost", "port": 5432}, "debug": false});
        let overlay = json!({"db": {"port": 6543}, "debug": true});

        let merged = deep_merge(base, overlay);
        assert_eq!(
            merged,
            json!({"db": {"host": "localhost", "port": 6543}, "debug": true})
        );
    }

    #[test]
    fn test_deep_merge_arrays_replace() {
        let merged = deep_merge(json!({"a": [1, 2]}), json!({"a": [3]}));
        assert_eq!(merged, json!({"a": [3]}));
    }

    #[test]
    fn test_deep_merge_all() {
        let merged = deep_merge_all(vec![json!({"a": 1}), json!({"b": 2}), json!({"a": 3})]);
        assert_eq!(merged, json!({"a": 3, "b": 2}));
    }

    #[test]
    fn test_get_path() {
        let value = json!({"api": {"port": 3000, "origins": ["a", "b"]}});
        assert_eq!(get_path(&value, "api.port"), Some(&json!(3000)));
        assert_eq!(get_path(&value, "api.origins.1"), Some(&json!("b")));
        assert_eq!(get_path(&value, "api.missing"), None);
    }

    #[test]
    fn test_get_path_malformed() {
        let value = json!({"api": {"port": 3000}});
        assert_eq!(get_path(&value, ""), None);
        assert_eq!(get_path(&value, ".api"), None);
        assert_eq!(get_path(&value, "api."), None);
        assert_eq!(get_path(&value, "api..port"), None);
    }

    #[test]
    fn test_pick_and_omit() {
        let value = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(pick(&value, &["a", "c"]), json!({"a": 1, "c": 3}));
        assert_eq!(omit(&value, &["a"]), json!({"b": 2, "c": 3}));
    }

    #[test]
    fn test_flatten_keys() {
        let value = json!({"api": {"port": 3000}, "env": "test"});
        let mut flat = flatten_keys(&value);
        flat.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            flat,
            vec![
                ("api.port".to_string(), json!(3000)),
                ("env".to_string(), json!("test")),
            ]
        );
    }
}
