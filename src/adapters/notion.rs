use crate::config::toml_config::NotionConfig;
use crate::domain::model::QueryPage;
use crate::domain::ports::Workspace;
use crate::utils::error::{Result, ThoughtError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use std::time::Duration;

static NOTION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}|[0-9a-f]{32})",
    )
    .expect("valid regex")
});

/// Extracts the object id from a workspace URL, or accepts a bare id.
///
/// `https://www.notion.so/team/Reading-List-0123456789abcdef0123456789abcdef?v=...`
/// yields `0123456789abcdef0123456789abcdef`.
pub fn parse_notion_id(url_or_id: &str) -> Result<String> {
    let trimmed = url_or_id.trim();
    // the view id in `?v=` is not the collection
    let path = trimmed.split(['?', '#']).next().unwrap_or(trimmed);

    NOTION_ID
        .find_iter(path)
        .last()
        .map(|m| m.as_str().replace('-', "").to_lowercase())
        .ok_or_else(|| ThoughtError::ValidationError {
            message: format!("'{}' is not a Notion URL or id", url_or_id),
        })
}

pub struct NotionClient {
    client: Client,
    base_url: String,
    token: String,
    version: String,
    page_size: u32,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ThoughtError::MissingConfigError {
                field: "notion.token (NOTION_ACCESS_TOKEN)".to_string(),
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            version: config.version.clone(),
            page_size: config.page_size,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.endpoint(path))
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let endpoint = self.endpoint(path);
        let mut request = self.request(method.clone(), path);
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!("📡 {} {}", method, endpoint);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 API response status: {}", status);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            tracing::error!("❌ {} {} failed with {}: {}", method, endpoint, status, message);
            return Err(ThoughtError::HttpStatusError {
                method: method.to_string(),
                endpoint,
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    fn parse_page(value: Value) -> Result<QueryPage> {
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl Workspace for NotionClient {
    async fn query_database(
        &self,
        database_id: &str,
        filter: Option<&Value>,
        start_cursor: Option<&str>,
    ) -> Result<QueryPage> {
        let mut body = json!({ "page_size": self.page_size });
        if let Some(filter) = filter {
            body["filter"] = filter.clone();
        }
        if let Some(cursor) = start_cursor {
            body["start_cursor"] = Value::String(cursor.to_string());
        }

        let path = format!("databases/{}/query", database_id);
        let value = self.send(Method::POST, &path, Some(&body)).await?;
        Self::parse_page(value)
    }

    async fn retrieve_database(&self, database_id: &str) -> Result<Value> {
        self.send(Method::GET, &format!("databases/{}", database_id), None)
            .await
    }

    async fn update_database(&self, database_id: &str, body: &Value) -> Result<Value> {
        self.send(Method::PATCH, &format!("databases/{}", database_id), Some(body))
            .await
    }

    async fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<QueryPage> {
        let mut path = format!("blocks/{}/children?page_size={}", block_id, self.page_size);
        if let Some(cursor) = start_cursor {
            path.push_str("&start_cursor=");
            path.push_str(&url::form_urlencoded::byte_serialize(cursor.as_bytes()).collect::<String>());
        }
        let value = self.send(Method::GET, &path, None).await?;
        Self::parse_page(value)
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Value> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        self.send(Method::POST, "pages", Some(&body)).await
    }

    async fn update_page(&self, page_id: &str, body: &Value) -> Result<Value> {
        self.send(Method::PATCH, &format!("pages/{}", page_id), Some(body))
            .await
    }
}
