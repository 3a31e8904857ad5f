//! Flatten nested record maps into dotted-path keys.

use crate::value::Value;
use std::collections::BTreeMap;

/// Flatten a `Value::Map` into `(dotted.path, scalar)` pairs. Non-map
/// leaves at any depth become a single entry keyed by the accumulated
/// path; `a.b` in a nested map becomes the key `"a.b"` (spec.md §3).
pub fn flatten(record: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    match record {
        Value::Map(m) => flatten_into(m, String::new(), &mut out),
        other => {
            out.insert(String::new(), other.clone());
        }
    }
    out
}

fn flatten_into(map: &BTreeMap<String, Value>, prefix: String, out: &mut BTreeMap<String, Value>) {
    for (k, v) in map {
        let key = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{}.{}", prefix, k)
        };
        match v {
            Value::Map(child) => flatten_into(child, key, out),
            leaf => {
                out.insert(key, leaf.clone());
            }
        }
    }
}

/// Inverse of [`flatten`]: insert `value` into `record` at the nested path
/// obtained by splitting `key` on `.`, creating intermediate maps as needed.
pub fn unflatten_insert(record: &mut BTreeMap<String, Value>, key: &str, value: Value) {
    let mut parts = key.split('.');
    let first = parts.next().unwrap_or(key);
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        record.insert(first.to_string(), value);
        return;
    }
    let entry = record
        .entry(first.to_string())
        .or_insert_with(|| Value::Map(BTreeMap::new()));
    if !matches!(entry, Value::Map(_)) {
        *entry = Value::Map(BTreeMap::new());
    }
    if let Value::Map(child) = entry {
        unflatten_insert(child, &rest.join("."), value);
    }
}
