//! Human-readable `field: value` rendering of entities
//!
//! Output is deterministic for a given entity: fields appear in key order,
//! nested records become indented `name { ... }` blocks, list fields repeat
//! the field name once per element, and default field values (empty
//! strings, zero, false, null, empty lists) are omitted. List elements are
//! always rendered, defaults included, so element positions survive.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::Result;

/// Render any serializable entity as text, one `field: value` per line
pub fn to_text<T: Serialize>(entity: &T) -> Result<String> {
    let value = serde_json::to_value(entity)?;
    let mut out = String::new();
    if let Value::Object(map) = &value {
        write_fields(&mut out, 0, map);
    } else if !is_default(&value) {
        out.push_str(&scalar(&value));
        out.push('\n');
    }
    Ok(out)
}

fn write_fields(out: &mut String, depth: usize, map: &Map<String, Value>) {
    let mut pairs: Vec<_> = map.iter().collect();
    pairs.sort_by_key(|(k, _)| *k);
    for (key, field) in pairs {
        write_field(out, depth, key, field);
    }
}

fn write_field(out: &mut String, depth: usize, key: &str, value: &Value) {
    if is_default(value) {
        return;
    }
    write_value(out, depth, key, value);
}

/// Render without the default check; list elements always keep their slot
fn write_value(out: &mut String, depth: usize, key: &str, value: &Value) {
    let indent = "  ".repeat(depth);
    match value {
        Value::Object(map) => {
            out.push_str(&format!("{indent}{key} {{\n"));
            write_fields(out, depth + 1, map);
            out.push_str(&format!("{indent}}}\n"));
        }
        Value::Array(items) => {
            for item in items {
                write_value(out, depth, key, item);
            }
        }
        _ => out.push_str(&format!("{indent}{key}: {}\n", scalar(value))),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        // JSON string escaping doubles as text-format quoting
        Value::String(_) => value.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_default(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.values().all(is_default),
    }
}
