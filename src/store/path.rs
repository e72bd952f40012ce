//! Dotted field paths over JSON documents
//!
//! `lookup_path` is strict: numeric segments index arrays, anything else
//! must be an object key. `collect_path` follows query semantics instead,
//! where a non-numeric segment applied to an array fans out over its
//! elements (`nutrients.amount` → every amount).

use serde_json::{Map, Value};

/// Single value at a dotted path
pub fn lookup_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Every value reachable at a dotted path, fanning out over arrays
pub fn collect_path<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![document];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => next.extend(map.get(segment)),
                Value::Array(items) => match segment.parse::<usize>() {
                    Ok(i) => next.extend(items.get(i)),
                    Err(_) => next.extend(
                        items
                            .iter()
                            .filter_map(|item| item.as_object())
                            .filter_map(|obj| obj.get(segment)),
                    ),
                },
                _ => {}
            }
        }
        current = next;
    }
    current
}

/// Sets a top-level or nested object field, creating intermediate objects
pub fn set_path(document: &mut Value, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = document;
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recipe() -> Value {
        json!({
            "views": 3,
            "rating": {"average": 4.5, "count": 2},
            "nutrients": [
                {"name": "Calories", "amount": 420},
                {"name": "Fat", "amount": 12}
            ]
        })
    }

    #[test]
    fn test_lookup_nested_and_positional() {
        let doc = recipe();
        assert_eq!(lookup_path(&doc, "views"), Some(&json!(3)));
        assert_eq!(lookup_path(&doc, "rating.average"), Some(&json!(4.5)));
        assert_eq!(lookup_path(&doc, "nutrients.0.amount"), Some(&json!(420)));
        assert_eq!(lookup_path(&doc, "nutrients.5.amount"), None);
        assert_eq!(lookup_path(&doc, "nutrients.amount"), None);
        assert_eq!(lookup_path(&doc, "missing.path"), None);
    }

    #[test]
    fn test_collect_fans_out_over_arrays() {
        let doc = recipe();
        assert_eq!(
            collect_path(&doc, "nutrients.amount"),
            vec![&json!(420), &json!(12)]
        );
        assert_eq!(collect_path(&doc, "nutrients.1.name"), vec![&json!("Fat")]);
        assert!(collect_path(&doc, "nope").is_empty());
    }

    #[test]
    fn test_set_path_creates_objects() {
        let mut doc = json!({"rating": {"count": 1}});
        set_path(&mut doc, "rating.average", json!(5));
        set_path(&mut doc, "calories", json!(300));
        assert_eq!(
            doc,
            json!({"rating": {"count": 1, "average": 5}, "calories": 300})
        );
    }
}
