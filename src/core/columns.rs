//! Display names for flattened page columns.

use crate::domain::model::{Record, Table};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static DATE_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^properties\.(?P<field>[^.]+)\.date\.(?P<rest>.+)$").expect("valid regex")
});

static FORMULA_OR_SELECT_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^properties\.(?P<field>[^.]+)\.(?:formula|select)(?:\..*)?$")
        .expect("valid regex")
});

static PROPERTY_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^properties\.(?P<field>[^.]+)\.").expect("valid regex"));

/// `properties.<Field>.id` / `.type`: the property's own schema id and kind.
static PROPERTY_METADATA_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^properties\.[^.]+\.(?:id|type)$").expect("valid regex"));

/// Leaves that describe a value rather than hold it.
const METADATA_LEAVES: &[&str] = &["id", "color", "type"];

pub fn clean_column_name(raw_name: &str) -> String {
    if let Some(caps) = DATE_COLUMN.captures(raw_name) {
        return format!("{}_{}", &caps["field"], &caps["rest"]);
    }
    if let Some(caps) = FORMULA_OR_SELECT_COLUMN.captures(raw_name) {
        return caps["field"].to_string();
    }
    if let Some(caps) = PROPERTY_COLUMN.captures(raw_name) {
        return caps["field"].to_string();
    }
    raw_name.to_string()
}

/// One clean column and the raw columns that feed it, best source first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub clean: String,
    pub sources: Vec<String>,
}

impl ColumnMapping {
    /// The first non-null source value of the record, or null when a source
    /// is present but empty.
    pub fn resolve(&self, record: &Record) -> Option<Value> {
        let mut present = self.sources.iter().filter_map(|raw| record.data.get(raw));
        let first = present.next()?;
        if !first.is_null() {
            return Some(first.clone());
        }
        Some(present.find(|v| !v.is_null()).cloned().unwrap_or(Value::Null))
    }
}

fn is_metadata_leaf(raw: &str) -> bool {
    raw.rsplit_once('.')
        .is_some_and(|(_, leaf)| METADATA_LEAVES.contains(&leaf))
}

/// Cleans every column name, grouping the raw columns that clean to the same
/// name. Value leaves feed a group ahead of metadata leaves, which are only
/// kept when the group has nothing else. Property-level `id`/`type` columns
/// are dropped.
pub fn normalize_columns(columns: &[String]) -> Vec<ColumnMapping> {
    let mut groups: Vec<(String, Vec<String>, Vec<String>)> = Vec::new();

    for raw in columns {
        if PROPERTY_METADATA_COLUMN.is_match(raw) {
            tracing::debug!("Dropping property metadata column {}", raw);
            continue;
        }
        let clean = clean_column_name(raw);
        let index = match groups.iter().position(|(name, _, _)| *name == clean) {
            Some(index) => index,
            None => {
                groups.push((clean, Vec::new(), Vec::new()));
                groups.len() - 1
            }
        };
        let (_, values, metadata) = &mut groups[index];
        if is_metadata_leaf(raw) {
            metadata.push(raw.clone());
        } else {
            values.push(raw.clone());
        }
    }

    groups
        .into_iter()
        .map(|(clean, values, metadata)| {
            let sources = if values.is_empty() { metadata } else { values };
            if sources.len() > 1 {
                tracing::debug!("Column '{}' merges {:?}", clean, sources);
            }
            ColumnMapping { clean, sources }
        })
        .collect()
}

/// Renames the table's columns to their clean names. Each cell takes the
/// first non-null value among the raw columns that share its clean name.
pub fn clean_table_columns(table: &Table) -> Table {
    let mappings = normalize_columns(table.columns());

    let records = table.records().iter().map(|record| {
        let mut data = Map::new();
        for mapping in &mappings {
            if let Some(value) = mapping.resolve(record) {
                data.insert(mapping.clean.clone(), value);
            }
        }
        Record {
            source_id: record.source_id.clone(),
            data,
        }
    });

    Table::from_records(records)
}
