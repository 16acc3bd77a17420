//! Turning nested workspace pages into flat rows.

use crate::domain::model::Record;
use serde_json::{Map, Value};

/// Concatenates the text of each run, in order.
pub fn rich_text_to_plain_text(runs: &[Value]) -> String {
    runs.iter()
        .filter_map(|run| {
            run.pointer("/text/content")
                .or_else(|| run.get("plain_text"))
                .and_then(Value::as_str)
        })
        .collect()
}

/// Option objects become their names. Anything that is not a non-empty list
/// comes back unchanged.
pub fn select_to_plain_text(value: &Value) -> Value {
    match value {
        Value::Array(options) if !options.is_empty() => Value::Array(
            options
                .iter()
                .map(|option| option.get("name").cloned().unwrap_or(Value::Null))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// json-normalize style flattening: objects become dotted keys, lists and
/// scalars are leaves. Empty objects produce no column.
pub fn flatten_value(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    match value {
        Value::Object(map) => flatten_into("", map, &mut out),
        other => {
            out.insert("value".to_string(), other.clone());
        }
    }
    out
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Map<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => flatten_into(&path, inner, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

/// A page flattened into dotted columns, keyed by its id.
pub fn page_to_flat_record(page: &Value) -> Record {
    let record = Record::new(flatten_value(page));
    match page.get("id").and_then(Value::as_str) {
        Some(id) => record.with_source_id(id),
        None => record,
    }
}

fn names(values: &[Value], pointer: &str) -> Value {
    Value::Array(
        values
            .iter()
            .filter_map(|v| v.pointer(pointer).cloned())
            .collect(),
    )
}

/// The plain value of one typed property object (`{"type": "...", "<type>": ...}`).
pub fn property_to_plain(property: &Value) -> Value {
    let Some(kind) = property.get("type").and_then(Value::as_str) else {
        return property.clone();
    };
    let inner = property.get(kind).unwrap_or(&Value::Null);

    match kind {
        "title" | "rich_text" => match inner {
            Value::Array(runs) => Value::String(rich_text_to_plain_text(runs)),
            _ => Value::String(String::new()),
        },
        "select" | "status" => inner.get("name").cloned().unwrap_or(Value::Null),
        "multi_select" => match inner {
            Value::Array(options) if options.is_empty() => Value::Array(Vec::new()),
            other => select_to_plain_text(other),
        },
        "date" => inner.get("start").cloned().unwrap_or(Value::Null),
        "formula" => match inner.get("type").and_then(Value::as_str) {
            Some(result_kind) => inner.get(result_kind).cloned().unwrap_or(Value::Null),
            None => Value::Null,
        },
        "rollup" => match inner.get("type").and_then(Value::as_str) {
            Some("array") => match inner.get("array") {
                Some(Value::Array(items)) => {
                    Value::Array(items.iter().map(property_to_plain).collect())
                }
                _ => Value::Array(Vec::new()),
            },
            Some(result_kind) => inner.get(result_kind).cloned().unwrap_or(Value::Null),
            None => Value::Null,
        },
        "people" => match inner {
            Value::Array(people) => names(people, "/name"),
            _ => Value::Array(Vec::new()),
        },
        "relation" => match inner {
            Value::Array(pages) => names(pages, "/id"),
            _ => Value::Array(Vec::new()),
        },
        "files" => match inner {
            Value::Array(files) => names(files, "/name"),
            _ => Value::Array(Vec::new()),
        },
        "created_by" | "last_edited_by" => inner
            .get("name")
            .or_else(|| inner.get("id"))
            .cloned()
            .unwrap_or(Value::Null),
        "unique_id" => match (inner.get("prefix"), inner.get("number")) {
            (Some(Value::String(prefix)), Some(number)) => {
                Value::String(format!("{}-{}", prefix, number))
            }
            (_, Some(number)) => number.clone(),
            _ => Value::Null,
        },
        _ => inner.clone(),
    }
}

/// A page's properties as plain values keyed by property name.
pub fn page_to_plain_record(page: &Value) -> Record {
    let mut data = Map::new();
    if let Some(Value::Object(properties)) = page.get("properties") {
        for (name, property) in properties {
            data.insert(name.clone(), property_to_plain(property));
        }
    }
    let record = Record::new(data);
    match page.get("id").and_then(Value::as_str) {
        Some(id) => record.with_source_id(id),
        None => record,
    }
}

/// Simplifies a flattened cell based on the property type its column ends in.
pub fn simplify_cell(column: &str, value: &Value) -> Value {
    let leaf = column.rsplit('.').next().unwrap_or(column);
    match (leaf, value) {
        ("title" | "rich_text", Value::Array(runs)) => {
            Value::String(rich_text_to_plain_text(runs))
        }
        ("multi_select", _) => select_to_plain_text(value),
        _ => value.clone(),
    }
}

pub fn simplify_record(record: &Record) -> Record {
    let data = record
        .data
        .iter()
        .map(|(column, value)| (column.clone(), simplify_cell(column, value)))
        .collect();
    Record {
        source_id: record.source_id.clone(),
        data,
    }
}
