//! Table serialization for exports.

use crate::domain::model::Table;
use crate::utils::error::{Result, ThoughtError};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ThoughtError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(ThoughtError::ValidationError {
                message: format!("unsupported export format '{}', expected json or csv", other),
            }),
        }
    }
}

/// Text form of a cell. Lists of strings are joined, other structures stay JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

pub fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if !table.columns().is_empty() {
        writer.write_record(table.columns())?;
        for record in table.records() {
            let row = table
                .columns()
                .iter()
                .map(|column| record.get(column).map(cell_text).unwrap_or_default());
            writer.write_record(row)?;
        }
    }
    writer
        .into_inner()
        .map_err(|e| ThoughtError::IoError(e.into_error()))
}

pub fn to_json(table: &Table) -> Result<Vec<u8>> {
    let rows: Vec<&serde_json::Map<String, Value>> =
        table.records().iter().map(|r| &r.data).collect();
    Ok(serde_json::to_vec_pretty(&rows)?)
}

pub fn serialize(table: &Table, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Json => to_json(table),
        ExportFormat::Csv => to_csv(table),
    }
}
