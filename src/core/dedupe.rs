//! Exact-match record deduplication.
//!
//! Every unordered pair of rows is a candidate. A pair matches when the rows
//! agree on every comparison field; the losing member of each matched pair is
//! dropped.

use crate::domain::model::{Record, Table};
use crate::utils::error::{Result, ThoughtError};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepPolicy {
    First,
    Last,
}

impl KeepPolicy {
    pub fn from_keep_first(keep_first: bool) -> Self {
        if keep_first {
            Self::First
        } else {
            Self::Last
        }
    }
}

/// Resolves the comparison field set against the table's columns.
pub fn comparison_fields(table: &Table, fields: Option<&[String]>) -> Result<Vec<String>> {
    let Some(fields) = fields else {
        return Ok(table.columns().to_vec());
    };

    if fields.is_empty() {
        return Err(ThoughtError::ValidationError {
            message: "at least one comparison field is required".to_string(),
        });
    }

    let missing: Vec<&str> = fields
        .iter()
        .filter(|f| !table.has_column(f))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(ThoughtError::ValidationError {
            message: format!(
                "comparison field(s) not present in the table: {}. Available columns: {}",
                missing.join(", "),
                table.columns().join(", ")
            ),
        });
    }

    Ok(fields.to_vec())
}

fn field_value<'a>(record: &'a Record, field: &str) -> &'a Value {
    record.get(field).unwrap_or(&Value::Null)
}

/// Sum of per-field exact-match features for one candidate pair.
fn match_score(left: &Record, right: &Record, fields: &[String]) -> usize {
    fields
        .iter()
        .filter(|field| field_value(left, field) == field_value(right, field))
        .count()
}

/// Indices of the rows that lose at least one matched pair, ascending.
pub fn duplicate_indices(
    table: &Table,
    fields: Option<&[String]>,
    policy: KeepPolicy,
) -> Result<Vec<usize>> {
    let fields = comparison_fields(table, fields)?;
    let records = table.records();
    if records.len() < 2 || fields.is_empty() {
        return Ok(Vec::new());
    }

    let mut removed = BTreeSet::new();
    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            if match_score(&records[i], &records[j], &fields) != fields.len() {
                continue;
            }
            let loser = match policy {
                KeepPolicy::First => j,
                KeepPolicy::Last => i,
            };
            removed.insert(loser);
        }
    }

    tracing::debug!(
        "Compared {} candidate pairs on {} field(s), {} row(s) marked for removal",
        records.len() * (records.len() - 1) / 2,
        fields.len(),
        removed.len()
    );

    Ok(removed.into_iter().collect())
}

pub fn dedupe(table: &Table, fields: Option<&[String]>, keep_first: bool) -> Result<Table> {
    let removed = duplicate_indices(table, fields, KeepPolicy::from_keep_first(keep_first))?;
    if removed.is_empty() {
        return Ok(table.clone());
    }

    let removed: BTreeSet<usize> = removed.into_iter().collect();
    let kept = table
        .records()
        .iter()
        .enumerate()
        .filter(|(index, _)| !removed.contains(index))
        .map(|(_, record)| record.clone());

    Ok(Table::from_records(kept))
}
