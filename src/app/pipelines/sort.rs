use crate::core::source::query_all;
use crate::domain::ports::Workspace;
use crate::utils::error::{Result, ThoughtError};
use serde_json::{json, Map, Value};
use std::fmt;

pub const DEFAULT_SORT_FIELD: &str = "tags";

#[derive(Debug, Clone)]
pub struct SortOptions {
    pub collection: String,
    pub field: String,
    /// Also reorder the values stored on every page.
    pub record_values: bool,
    pub dry_run: bool,
}

impl SortOptions {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field: DEFAULT_SORT_FIELD.to_string(),
            record_values: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSummary {
    pub property: String,
    pub options: usize,
    pub schema_updated: bool,
    pub pages_updated: usize,
}

impl fmt::Display for SortSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}': {} option(s), schema {}, {} page(s) reordered",
            self.property,
            self.options,
            if self.schema_updated { "reordered" } else { "already sorted" },
            self.pages_updated
        )
    }
}

fn option_name(option: &Value) -> String {
    option
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

/// Case-insensitive, stable. Returns `None` when already in order.
pub fn sorted_options(options: &[Value]) -> Option<Vec<Value>> {
    let mut sorted = options.to_vec();
    sorted.sort_by_key(option_name);
    (sorted != options).then_some(sorted)
}

/// Exact name first, then case-insensitive.
fn find_property<'a>(properties: &'a Map<String, Value>, field: &str) -> Option<(&'a String, &'a Value)> {
    properties
        .iter()
        .find(|(name, _)| name.as_str() == field)
        .or_else(|| properties.iter().find(|(name, _)| name.eq_ignore_ascii_case(field)))
}

/// Sorts the options of a select or multi-select property alphabetically.
pub async fn sort_collection<W>(workspace: &W, options: &SortOptions) -> Result<SortSummary>
where
    W: Workspace + ?Sized,
{
    let database = workspace.retrieve_database(&options.collection).await?;
    let properties = database
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let (name, property) = find_property(&properties, &options.field).ok_or_else(|| {
        ThoughtError::ValidationError {
            message: format!(
                "property '{}' not found. Available properties: {}",
                options.field,
                properties.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        }
    })?;

    let kind = property.get("type").and_then(Value::as_str).unwrap_or_default();
    if kind != "select" && kind != "multi_select" {
        return Err(ThoughtError::ValidationError {
            message: format!(
                "property '{}' is a {} property; only select and multi_select can be sorted",
                name, kind
            ),
        });
    }

    let current: Vec<Value> = property
        .pointer(&format!("/{}/options", kind))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut summary = SortSummary {
        property: name.clone(),
        options: current.len(),
        ..SortSummary::default()
    };

    if let Some(sorted) = sorted_options(&current) {
        summary.schema_updated = true;
        if options.dry_run {
            tracing::info!("🧪 Dry run: would reorder {} options of '{}'", sorted.len(), name);
        } else {
            let body = json!({ "properties": { name.as_str(): { kind: { "options": sorted } } } });
            workspace.update_database(&options.collection, &body).await?;
            tracing::info!("🔤 Reordered {} options of '{}'", sorted.len(), name);
        }
    }

    if options.record_values {
        if kind != "multi_select" {
            tracing::warn!("⚠️ '{}' holds a single value per page, nothing to reorder", name);
            return Ok(summary);
        }
        summary.pages_updated = sort_page_values(workspace, options, name).await?;
    }

    Ok(summary)
}

async fn sort_page_values<W>(workspace: &W, options: &SortOptions, property: &str) -> Result<usize>
where
    W: Workspace + ?Sized,
{
    let pages = query_all(workspace, &options.collection, None).await?;
    let mut updated = 0;

    for page in &pages {
        let Some(page_id) = page.get("id").and_then(Value::as_str) else {
            continue;
        };
        let values = page
            .pointer(&format!("/properties/{}/multi_select", property.replace('~', "~0").replace('/', "~1")))
            .and_then(Value::as_array);
        let Some(sorted) = values.and_then(|v| sorted_options(v)) else {
            continue;
        };

        updated += 1;
        if options.dry_run {
            tracing::debug!("🧪 Dry run: would reorder values of {}", page_id);
            continue;
        }
        let names: Vec<Value> = sorted
            .iter()
            .map(|option| json!({ "name": option.get("name").cloned().unwrap_or(Value::Null) }))
            .collect();
        let body = json!({ "properties": { property: { "multi_select": names } } });
        workspace.update_page(page_id, &body).await?;
    }

    Ok(updated)
}
