//! In-memory workspace and storage for pipeline tests.

use crate::domain::model::QueryPage;
use crate::domain::ports::{Storage, Workspace};
use crate::utils::error::{Result, ThoughtError};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query {
        database_id: String,
        filter: Option<Value>,
        cursor: Option<String>,
    },
    CreatePage {
        database_id: String,
        properties: Map<String, Value>,
    },
    UpdatePage {
        page_id: String,
        body: Value,
    },
    UpdateDatabase {
        database_id: String,
        body: Value,
    },
}

#[derive(Default)]
pub struct FakeWorkspace {
    pub pages: Vec<Value>,
    pub page_size: usize,
    pub database: Value,
    pub children: Vec<Value>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeWorkspace {
    pub fn with_pages(pages: Vec<Value>) -> Self {
        Self {
            pages,
            page_size: 2,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Query { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn page_of(items: &[Value], page_size: usize, cursor: Option<&str>) -> QueryPage {
        let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (start + page_size.max(1)).min(items.len());
        QueryPage {
            results: items[start..end].to_vec(),
            has_more: end < items.len(),
            next_cursor: (end < items.len()).then(|| end.to_string()),
        }
    }
}

#[async_trait]
impl Workspace for FakeWorkspace {
    async fn query_database(
        &self,
        database_id: &str,
        filter: Option<&Value>,
        start_cursor: Option<&str>,
    ) -> Result<QueryPage> {
        self.record(Call::Query {
            database_id: database_id.to_string(),
            filter: filter.cloned(),
            cursor: start_cursor.map(str::to_string),
        });
        Ok(Self::page_of(&self.pages, self.page_size, start_cursor))
    }

    async fn retrieve_database(&self, _database_id: &str) -> Result<Value> {
        if self.database.is_null() {
            return Err(ThoughtError::HttpStatusError {
                method: "GET".to_string(),
                endpoint: "databases".to_string(),
                status: 404,
                message: "not found".to_string(),
            });
        }
        Ok(self.database.clone())
    }

    async fn update_database(&self, database_id: &str, body: &Value) -> Result<Value> {
        self.record(Call::UpdateDatabase {
            database_id: database_id.to_string(),
            body: body.clone(),
        });
        Ok(self.database.clone())
    }

    async fn list_block_children(
        &self,
        _block_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<QueryPage> {
        Ok(Self::page_of(&self.children, self.page_size, start_cursor))
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Value> {
        self.record(Call::CreatePage {
            database_id: database_id.to_string(),
            properties,
        });
        Ok(json!({"object": "page", "id": "new"}))
    }

    async fn update_page(&self, page_id: &str, body: &Value) -> Result<Value> {
        self.record(Call::UpdatePage {
            page_id: page_id.to_string(),
            body: body.clone(),
        });
        Ok(json!({"object": "page", "id": page_id}))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl Storage for MemoryStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        if self.fail {
            return Err(ThoughtError::ExportWriteError {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        Ok(format!("memory://{}", path))
    }
}

/// A page with a title and a select property, shaped like the workspace API.
pub fn page(id: &str, name: &str, status: Option<&str>) -> Value {
    let select = status.map(|s| json!({"id": format!("opt-{}", s), "name": s, "color": "blue"}));
    json!({
        "object": "page",
        "id": id,
        "url": format!("https://www.notion.so/{}", id),
        "properties": {
            "Name": {"id": "title", "type": "title", "title": [
                {"type": "text", "text": {"content": name}, "plain_text": name}
            ]},
            "Status": {"id": "s", "type": "select", "select": select}
        }
    })
}
