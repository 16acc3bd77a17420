use crate::core::output::cell_text;
use crate::core::source::list_all_children;
use crate::domain::model::{Record, Table};
use crate::domain::ports::{Pipeline, Workspace};
use crate::services::{ActionArgs, Service};
use crate::utils::error::{Result, ThoughtError};
use chrono::DateTime;
use serde_json::{json, Map, Value};

/// Text properties reject content longer than this.
const MAX_TEXT_LENGTH: usize = 2000;

/// Name of the database a service action syncs into.
pub fn destination_name(service: &str, action: &str) -> String {
    format!("{}_{}", service, action)
}

/// A database under the target page, with its property types.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub database_id: String,
    pub title: String,
    /// `(property name, property type)` in schema order.
    pub properties: Vec<(String, String)>,
}

impl Destination {
    pub fn from_database(database_id: &str, title: &str, database: &Value) -> Self {
        let properties = database
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .filter_map(|(name, prop)| {
                        let kind = prop.get("type").and_then(Value::as_str)?;
                        Some((name.clone(), kind.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            database_id: database_id.to_string(),
            title: title.to_string(),
            properties,
        }
    }

    /// Exact name first, then case-insensitive.
    pub fn property_for(&self, field: &str) -> Option<(&str, &str)> {
        self.properties
            .iter()
            .find(|(name, _)| name == field)
            .or_else(|| {
                self.properties
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(field))
            })
            .map(|(name, kind)| (name.as_str(), kind.as_str()))
    }
}

fn child_database_title(block: &Value) -> Option<&str> {
    if block.get("type").and_then(Value::as_str) != Some("child_database") {
        return None;
    }
    block.pointer("/child_database/title").and_then(Value::as_str)
}

/// Finds the single child database called `name` under `target_page`.
pub async fn resolve_destination<W>(workspace: &W, target_page: &str, name: &str) -> Result<Destination>
where
    W: Workspace + ?Sized,
{
    let children = list_all_children(workspace, target_page).await?;
    let found: Vec<&Value> = children
        .iter()
        .filter(|block| child_database_title(block) == Some(name))
        .collect();

    let block = match found.as_slice() {
        [] => {
            return Err(ThoughtError::DestinationMissing {
                name: name.to_string(),
            })
        }
        [block] => *block,
        many => {
            return Err(ThoughtError::DestinationNotUnique {
                name: name.to_string(),
                count: many.len(),
            })
        }
    };

    let database_id = block
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ThoughtError::ProcessingError {
            message: format!("child database '{}' has no id", name),
        })?;
    let database = workspace.retrieve_database(database_id).await?;
    let destination = Destination::from_database(database_id, name, &database);
    tracing::debug!(
        "Resolved destination '{}' to {} with {} properties",
        name,
        destination.database_id,
        destination.properties.len()
    );
    Ok(destination)
}

fn truncated(text: String) -> String {
    if text.chars().count() <= MAX_TEXT_LENGTH {
        text
    } else {
        text.chars().take(MAX_TEXT_LENGTH).collect()
    }
}

fn as_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_date(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.to_rfc3339()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn option_names(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(cell_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => cell_text(other)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    }
}

/// Property value payload for a destination property of type `kind`.
/// `None` when the type is not writable or the value does not fit it.
pub fn encode_property(kind: &str, value: &Value) -> Option<Value> {
    let text = || truncated(cell_text(value));
    let encoded = match kind {
        "title" | "rich_text" => json!({ kind: [{"type": "text", "text": {"content": text()}}] }),
        "number" => json!({ "number": as_number(value)? }),
        "checkbox" => json!({ "checkbox": as_bool(value)? }),
        "url" | "email" | "phone_number" => {
            let text = text();
            if text.is_empty() {
                json!({ kind: null })
            } else {
                json!({ kind: text })
            }
        }
        "select" => {
            let name = text();
            if name.is_empty() {
                json!({"select": null})
            } else {
                json!({"select": {"name": name}})
            }
        }
        "multi_select" => {
            let options: Vec<Value> = option_names(value)
                .into_iter()
                .map(|name| json!({"name": name}))
                .collect();
            json!({"multi_select": options})
        }
        "date" => json!({"date": {"start": as_date(value)?}}),
        _ => return None,
    };
    Some(encoded)
}

/// Page properties for one record. Fields without a matching property are skipped.
pub fn encode_record(destination: &Destination, record: &Record) -> Map<String, Value> {
    let mut properties = Map::new();
    for (field, value) in &record.data {
        let Some((name, kind)) = destination.property_for(field) else {
            continue;
        };
        if properties.contains_key(name) {
            continue;
        }
        match encode_property(kind, value) {
            Some(encoded) => {
                properties.insert(name.to_string(), encoded);
            }
            None => tracing::debug!("Skipping field '{}': not writable as {}", field, kind),
        }
    }
    properties
}

/// Appends the rows a service action returns to its destination database.
pub struct SyncPipeline<W: Workspace> {
    workspace: W,
    service: Box<dyn Service>,
    action: String,
    args: ActionArgs,
    destination: Destination,
    dry_run: bool,
}

impl<W: Workspace> SyncPipeline<W> {
    pub fn new(
        workspace: W,
        service: Box<dyn Service>,
        action: impl Into<String>,
        args: ActionArgs,
        destination: Destination,
    ) -> Self {
        Self {
            workspace,
            service,
            action: action.into(),
            args,
            destination,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[async_trait::async_trait]
impl<W: Workspace> Pipeline for SyncPipeline<W> {
    async fn extract(&self) -> Result<Table> {
        self.service.call(&self.action, &self.args).await
    }

    async fn transform(&self, data: Table) -> Result<Table> {
        let unmatched: Vec<&String> = data
            .columns()
            .iter()
            .filter(|c| self.destination.property_for(c).is_none())
            .collect();
        if !unmatched.is_empty() {
            tracing::debug!(
                "Fields with no property in '{}': {:?}",
                self.destination.title,
                unmatched
            );
        }

        let mut pages = Table::new();
        for record in data.records() {
            let properties = encode_record(&self.destination, record);
            if properties.is_empty() {
                tracing::warn!("⚠️ Skipping a record with no writable fields");
                continue;
            }
            pages.push(Record::new(properties));
        }
        Ok(pages)
    }

    async fn load(&self, result: Table) -> Result<String> {
        if self.dry_run {
            for record in result.records() {
                let properties = Value::Object(record.data.clone()).to_string();
                tracing::info!("🧪 Dry run: would create page with {}", properties);
            }
            return Ok(format!(
                "{} page(s) ready for '{}' (dry run, nothing created)",
                result.len(),
                self.destination.title
            ));
        }

        for record in result.records() {
            self.workspace
                .create_page(&self.destination.database_id, record.data.clone())
                .await?;
        }
        Ok(format!(
            "created {} page(s) in '{}'",
            result.len(),
            self.destination.title
        ))
    }
}
