use crate::adapters::instapaper::InstapaperClient;
use crate::config::toml_config::AppConfig;
use crate::domain::model::Table;
use crate::services::registry::{ActionArgs, ActionFuture, ActionTable, Service};
use crate::utils::error::Result;
use async_trait::async_trait;

pub const SERVICE_NAME: &str = "instapaper";

pub struct InstapaperService {
    client: InstapaperClient,
    default_folder: String,
    actions: ActionTable<InstapaperService>,
}

fn bookmarks_action<'a>(service: &'a InstapaperService, args: &'a ActionArgs) -> ActionFuture<'a> {
    let folder = args.get_or("folder", &service.default_folder);
    Box::pin(service.client.bookmarks(folder))
}

impl InstapaperService {
    pub fn new(client: InstapaperClient, default_folder: String) -> Self {
        Self {
            client,
            default_folder,
            actions: ActionTable::new(SERVICE_NAME).register("bookmarks", bookmarks_action),
        }
    }
}

pub fn build(config: &AppConfig) -> Result<Box<dyn Service>> {
    Ok(Box::new(InstapaperService::new(
        InstapaperClient::new(config.instapaper.clone())?,
        config.instapaper.default_folder.clone(),
    )))
}

#[async_trait]
impl Service for InstapaperService {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn actions(&self) -> Vec<String> {
        self.actions.names()
    }

    async fn authorize(&mut self) -> Result<()> {
        self.client.authorize().await
    }

    async fn call(&self, action: &str, args: &ActionArgs) -> Result<Table> {
        let action = self.actions.resolve(action)?;
        tracing::debug!("Calling {} action with {:?}", SERVICE_NAME, args);
        action(self, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::InstapaperConfig;
    use crate::utils::error::ThoughtError;
    use httpmock::prelude::*;
    use serde_json::json;

    fn service(base_url: String) -> InstapaperService {
        let config = InstapaperConfig {
            base_url,
            consumer_key: Some("ck".to_string()),
            consumer_secret: Some("cs".to_string()),
            username: Some("me".to_string()),
            ..InstapaperConfig::default()
        };
        InstapaperService::new(InstapaperClient::new(config).unwrap(), "archive".to_string())
    }

    #[tokio::test]
    async fn test_folder_argument_overrides_default() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/1/oauth/access_token");
            then.status(200).body("oauth_token=t&oauth_token_secret=s");
        });
        let starred = server.mock(|when, then| {
            when.method(POST)
                .path("/1/bookmarks/list")
                .body_contains("folder_id=starred");
            then.status(200)
                .json_body(json!([{"type": "bookmark", "bookmark_id": 7}]));
        });

        let mut service = service(server.base_url());
        service.authorize().await.unwrap();
        let table = service
            .call("bookmarks", &ActionArgs::new().with("folder", "starred"))
            .await
            .unwrap();

        starred.assert();
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let service = service("http://127.0.0.1:1".to_string());
        let err = service.call("highlights", &ActionArgs::new()).await.unwrap_err();
        assert!(matches!(err, ThoughtError::UnknownAction { .. }));
    }
}
