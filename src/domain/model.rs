use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a table. `source_id` identifies the row in the system it came
/// from (a workspace page id) and is not a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            source_id: None,
            data,
        }
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// Records in source order plus the union of their fields, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.push(record);
        }
        table
    }

    pub fn push(&mut self, record: Record) {
        for key in record.data.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.records.push(record);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keeps only the given columns, in the given order, each once. Unknown
    /// names are returned as the error value.
    pub fn select_columns(&self, columns: &[String]) -> std::result::Result<Table, Vec<String>> {
        let mut columns = columns.to_vec();
        let mut seen = std::collections::HashSet::new();
        columns.retain(|c| seen.insert(c.clone()));

        let missing: Vec<String> = columns
            .iter()
            .filter(|c| !self.has_column(c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let records = self.records.iter().map(|record| {
            let mut data = Map::new();
            for column in &columns {
                if let Some(value) = record.data.get(column) {
                    data.insert(column.clone(), value.clone());
                }
            }
            Record {
                source_id: record.source_id.clone(),
                data,
            }
        });

        let mut table = Table::from_records(records);
        table.columns = columns;
        Ok(table)
    }
}

/// Created once per command run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMetadata {
    pub started_at: DateTime<Utc>,
}

impl RunMetadata {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }

    pub fn file_stamp(&self) -> String {
        self.started_at.format("%Y%m%dT%H%M%SZ").to_string()
    }
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// One page of a paginated workspace listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
