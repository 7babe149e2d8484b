use serde_json::{Map, Value};
use crate::core::types::Document;

/// Output document for a hit. `include` keeps only the listed paths,
/// otherwise every field except the `exclude` paths is returned.
/// Paths may be dotted (`review.rating`); nesting is kept in the output.
pub fn project(doc: &Document, include: &[String], exclude: &[String]) -> Value {
    let full = doc.to_json();

    if !include.is_empty() {
        let mut out = Map::new();
        for path in include {
            if let Some(value) = lookup(&full, path) {
                insert_path(&mut out, path, value.clone());
            }
        }
        return Value::Object(out);
    }

    let mut out = full;
    for path in exclude {
        remove_path(&mut out, path);
    }
    out
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| current.get(segment))
}

fn insert_path(out: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            out.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = out
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_path(map, rest, value);
            }
        }
    }
}

fn remove_path(value: &mut Value, path: &str) {
    let Value::Object(map) = value else {
        return;
    };
    match path.split_once('.') {
        None => {
            map.remove(path);
        }
        Some((head, rest)) => {
            if let Some(child) = map.get_mut(head) {
                remove_path(child, rest);
            }
        }
    }
}
