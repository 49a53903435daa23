//! Dotted-path access into JSON values
//!
//! Paths look like `data.id` or `data.records.0.name`. A numeric segment
//! indexes into an array; every other segment is an object key. The empty
//! path addresses the value itself.

use serde_json::{Map, Value};

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

/// Look up the value at `path`, or `None` when any segment is missing
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments(path) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Store `new_value` at `path`, creating intermediate objects as needed.
///
/// A non-container met along the way is replaced by an object. Array
/// segments only address existing slots; an out-of-range index turns the
/// array into an object keyed by the segment.
pub fn set_path(value: &mut Value, path: &str, new_value: Value) {
    let parts: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = parts.split_last() else {
        *value = new_value;
        return;
    };

    let mut current = value;
    for segment in parents {
        current = child_mut(current, segment);
    }

    match current {
        Value::Array(items) => match last.parse::<usize>() {
            Ok(index) if index < items.len() => items[index] = new_value,
            _ => {
                let mut map = array_to_map(items);
                map.insert((*last).to_string(), new_value);
                *current = Value::Object(map);
            }
        },
        Value::Object(map) => {
            map.insert((*last).to_string(), new_value);
        }
        other => {
            let mut map = Map::new();
            map.insert((*last).to_string(), new_value);
            *other = Value::Object(map);
        }
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> &'a mut Value {
    let slot = match (&*value, segment.parse::<usize>()) {
        (Value::Array(items), Ok(index)) if index < items.len() => Some(index),
        _ => None,
    };

    match (slot, value) {
        (Some(index), Value::Array(items)) => &mut items[index],
        (_, value) => {
            if let Value::Array(items) = value {
                *value = Value::Object(array_to_map(items));
            } else if !value.is_object() {
                *value = Value::Object(Map::new());
            }

            match value {
                Value::Object(map) => map
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
                _ => unreachable!("value was just made an object"),
            }
        }
    }
}

fn array_to_map(items: &[Value]) -> Map<String, Value> {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested() {
        let value = json!({"data": {"id": "order-42", "tags": ["a", "b"]}});
        assert_eq!(get_path(&value, "data.id"), Some(&json!("order-42")));
        assert_eq!(get_path(&value, "data.tags.1"), Some(&json!("b")));
        assert_eq!(get_path(&value, ""), Some(&value));
    }

    #[test]
    fn test_get_missing() {
        let value = json!({"data": {"id": 1}});
        assert_eq!(get_path(&value, "data.name"), None);
        assert_eq!(get_path(&value, "data.id.deeper"), None);
        assert_eq!(get_path(&value, "data.0"), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut value = json!({});
        set_path(&mut value, "order.shipping.carrier", json!("ups"));
        assert_eq!(value, json!({"order": {"shipping": {"carrier": "ups"}}}));
    }

    #[test]
    fn test_set_overwrites_scalar_parent() {
        let mut value = json!({"order": 7});
        set_path(&mut value, "order.id", json!(7));
        assert_eq!(value, json!({"order": {"id": 7}}));
    }

    #[test]
    fn test_set_array_slot() {
        let mut value = json!({"ids": [1, 2, 3]});
        set_path(&mut value, "ids.1", json!(20));
        assert_eq!(value, json!({"ids": [1, 20, 3]}));
    }

    #[test]
    fn test_set_empty_path_replaces_root() {
        let mut value = json!({"a": 1});
        set_path(&mut value, "", json!([]));
        assert_eq!(value, json!([]));
    }
}
