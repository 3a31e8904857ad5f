//! Narrow, dynamically-typed input value accepted at the `insert` boundary.
//!
//! The core of this crate never inspects types past this boundary: every
//! leaf is stringified before it reaches the pattern extractor or a column
//! (spec.md §9, "Dynamically typed inputs").

use std::collections::BTreeMap;

/// A JSON-like leaf or nested mapping, the shape records are ingested as.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Stringify a non-map leaf for ingestion. Maps are never stringified;
    /// callers flatten them first (see `crate::flatten`).
    pub fn stringify(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Map(_) => unreachable!("maps are flattened before stringify"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(_) => Value::Str(v.to_string()),
            serde_json::Value::Object(m) => {
                Value::Map(m.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
