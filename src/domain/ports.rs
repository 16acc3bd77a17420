use crate::domain::model::{QueryPage, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// The subset of the workspace REST API the commands need.
#[async_trait]
pub trait Workspace: Send + Sync {
    async fn query_database(
        &self,
        database_id: &str,
        filter: Option<&Value>,
        start_cursor: Option<&str>,
    ) -> Result<QueryPage>;

    async fn retrieve_database(&self, database_id: &str) -> Result<Value>;

    async fn update_database(&self, database_id: &str, body: &Value) -> Result<Value>;

    async fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<QueryPage>;

    async fn create_page(&self, database_id: &str, properties: Map<String, Value>)
        -> Result<Value>;

    async fn update_page(&self, page_id: &str, body: &Value) -> Result<Value>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, data: Table) -> Result<Table>;
    async fn load(&self, result: Table) -> Result<String>;
}
