//! Flattening of TOML documents into dotted keys.

use std::collections::BTreeMap;
use toml::{Table, Value};

/// Flatten `document` into `a.b.c = value` pairs.
///
/// Nested tables extend the key with `.name`, arrays with `.index`. Strings
/// are kept verbatim; other scalars use their TOML rendering. Empty tables
/// and arrays produce no entries.
pub fn flatten(document: &Table) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (key, value) in document {
        flatten_value(key, value, &mut out);
    }
    out
}

fn flatten_value(key: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Table(table) => {
            for (child, value) in table {
                flatten_value(&format!("{}.{}", key, child), value, out);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_value(&format!("{}.{}", key, index), value, out);
            }
        }
        Value::String(s) => {
            out.insert(key.to_string(), s.clone());
        }
        other => {
            out.insert(key.to_string(), other.to_string());
        }
    }
}
