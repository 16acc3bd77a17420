use crate::core::columns::clean_table_columns;
use crate::core::flatten::{page_to_flat_record, simplify_record};
use crate::core::output::{serialize, ExportFormat};
use crate::core::source::query_all;
use crate::domain::model::{RunMetadata, Table};
use crate::domain::ports::{Pipeline, Storage, Workspace};
use crate::utils::error::{Result, ThoughtError};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Database id (already extracted from a URL).
    pub collection: String,
    pub format: ExportFormat,
    /// Columns to keep, by their final name. Empty keeps everything.
    pub columns: Vec<String>,
    pub clean_columns: bool,
    pub plain_text: bool,
    pub filter: Option<Value>,
}

impl ExportOptions {
    pub fn new(collection: impl Into<String>, format: ExportFormat) -> Self {
        Self {
            collection: collection.into(),
            format,
            columns: Vec::new(),
            clean_columns: false,
            plain_text: false,
            filter: None,
        }
    }
}

pub struct ExportPipeline<W: Workspace, S: Storage> {
    workspace: W,
    storage: S,
    options: ExportOptions,
    metadata: RunMetadata,
}

impl<W: Workspace, S: Storage> ExportPipeline<W, S> {
    pub fn new(workspace: W, storage: S, options: ExportOptions) -> Self {
        Self {
            workspace,
            storage,
            options,
            metadata: RunMetadata::new(),
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.{}",
            self.options.collection,
            self.metadata.file_stamp(),
            self.options.format.extension()
        )
    }
}

#[async_trait::async_trait]
impl<W: Workspace, S: Storage> Pipeline for ExportPipeline<W, S> {
    async fn extract(&self) -> Result<Table> {
        let pages = query_all(
            &self.workspace,
            &self.options.collection,
            self.options.filter.as_ref(),
        )
        .await?;
        Ok(Table::from_records(pages.iter().map(page_to_flat_record)))
    }

    async fn transform(&self, data: Table) -> Result<Table> {
        let mut table = data;

        if self.options.plain_text {
            table = Table::from_records(table.records().iter().map(simplify_record));
        }

        if self.options.clean_columns {
            table = clean_table_columns(&table);
            tracing::debug!("Cleaned columns: {:?}", table.columns());
        }

        if !self.options.columns.is_empty() {
            table = table
                .select_columns(&self.options.columns)
                .map_err(|missing| ThoughtError::ValidationError {
                    message: format!(
                        "unknown export column(s): {}. Available columns: {}",
                        missing.join(", "),
                        table.columns().join(", ")
                    ),
                })?;
        }

        Ok(table)
    }

    async fn load(&self, result: Table) -> Result<String> {
        let bytes = serialize(&result, self.options.format)?;
        let file_name = self.file_name();
        tracing::debug!(
            "Writing {} rows x {} columns to {}",
            result.len(),
            result.columns().len(),
            file_name
        );
        self.storage.write_file(&file_name, &bytes).await
    }
}
