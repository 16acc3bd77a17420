use crate::core::dedupe::{duplicate_indices, KeepPolicy};
use crate::core::flatten::page_to_plain_record;
use crate::core::output::to_csv;
use crate::core::source::query_all;
use crate::domain::model::{RunMetadata, Table};
use crate::domain::ports::{Pipeline, Storage, Workspace};
use crate::utils::error::{Result, ThoughtError};
use serde_json::json;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct DedupeOptions {
    pub collection: String,
    /// Comparison fields. `None` compares on every column.
    pub fields: Option<Vec<String>>,
    pub keep_first: bool,
    pub dry_run: bool,
}

impl DedupeOptions {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: None,
            keep_first: true,
            dry_run: false,
        }
    }
}

/// Removes exact duplicate pages from a database by archiving them.
pub struct DedupePipeline<W: Workspace, S: Storage> {
    workspace: W,
    snapshot: Option<S>,
    options: DedupeOptions,
    metadata: RunMetadata,
    /// Page ids in fetch order, filled by `extract`.
    fetched: std::sync::Mutex<Vec<Option<String>>>,
}

impl<W: Workspace, S: Storage> DedupePipeline<W, S> {
    pub fn new(workspace: W, options: DedupeOptions) -> Self {
        Self {
            workspace,
            snapshot: None,
            options,
            metadata: RunMetadata::new(),
            fetched: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Also writes a CSV of the surviving rows once duplicates are archived.
    pub fn with_snapshot(mut self, storage: S) -> Self {
        self.snapshot = Some(storage);
        self
    }

    async fn archive(&self, page_ids: &[String]) -> Result<()> {
        let body = json!({"archived": true});
        for (n, page_id) in page_ids.iter().enumerate() {
            tracing::debug!("Archiving duplicate {} ({}/{})", page_id, n + 1, page_ids.len());
            self.workspace.update_page(page_id, &body).await?;
        }
        Ok(())
    }

    async fn write_snapshot(&self, storage: &S, table: &Table) {
        let file_name = format!(
            "{}_dedupe_{}.csv",
            self.options.collection,
            self.metadata.file_stamp()
        );
        let written = match to_csv(table) {
            Ok(bytes) => storage.write_file(&file_name, &bytes).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(path) => tracing::info!("💾 Snapshot written to {}", path),
            Err(e) => tracing::warn!("⚠️ Could not write dedupe snapshot: {}", e),
        }
    }
}

#[async_trait::async_trait]
impl<W: Workspace, S: Storage> Pipeline for DedupePipeline<W, S> {
    async fn extract(&self) -> Result<Table> {
        let pages = query_all(&self.workspace, &self.options.collection, None).await?;
        let table = Table::from_records(pages.iter().map(page_to_plain_record));

        let ids = table
            .records()
            .iter()
            .map(|r| r.source_id.clone())
            .collect();
        *self.fetched.lock().map_err(|e| ThoughtError::ProcessingError {
            message: format!("fetched page list poisoned: {}", e),
        })? = ids;

        Ok(table)
    }

    async fn transform(&self, data: Table) -> Result<Table> {
        let removed = duplicate_indices(
            &data,
            self.options.fields.as_deref(),
            KeepPolicy::from_keep_first(self.options.keep_first),
        )?;
        if !removed.is_empty() {
            tracing::info!("🔍 Found {} duplicate row(s)", removed.len());
        }

        let removed: BTreeSet<usize> = removed.into_iter().collect();
        let kept = data
            .into_records()
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !removed.contains(index))
            .map(|(_, record)| record);
        Ok(Table::from_records(kept))
    }

    async fn load(&self, result: Table) -> Result<String> {
        let kept: BTreeSet<&str> = result
            .records()
            .iter()
            .filter_map(|r| r.source_id.as_deref())
            .collect();
        let duplicates: Vec<String> = {
            let fetched = self.fetched.lock().map_err(|e| ThoughtError::ProcessingError {
                message: format!("fetched page list poisoned: {}", e),
            })?;
            fetched
                .iter()
                .flatten()
                .filter(|id| !kept.contains(id.as_str()))
                .cloned()
                .collect()
        };

        let summary = if self.options.dry_run {
            for page_id in &duplicates {
                tracing::info!("🧪 Dry run: would archive {}", page_id);
            }
            format!(
                "{} duplicate(s) found, {} row(s) kept (dry run, nothing archived)",
                duplicates.len(),
                result.len()
            )
        } else {
            self.archive(&duplicates).await?;
            format!(
                "archived {} duplicate(s), {} row(s) kept",
                duplicates.len(),
                result.len()
            )
        };

        if let Some(storage) = &self.snapshot {
            self.write_snapshot(storage, &result).await;
        }

        Ok(summary)
    }
}
