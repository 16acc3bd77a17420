use crate::adapters::oauth1::{OAuth1Credentials, OAuth1Signer};
use crate::config::toml_config::InstapaperConfig;
use crate::domain::model::{Record, Table};
use crate::utils::error::{Result, ThoughtError};
use crate::utils::validation::validate_required_field;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;

const SERVICE: &str = "instapaper";
const AUTH_MODE: &str = "client_auth";
const ENDPOINT_AUTH: &str = "oauth/access_token";
const ENDPOINT_ALL_BOOKMARKS: &str = "bookmarks/list";

/// Key sets of list entries that describe the account, not a bookmark.
const METADATA_KEYS: &[&str] = &["type"];
const ACCOUNT_KEYS: &[&str] = &["subscription_is_active", "type", "user_id", "username"];

/// Instapaper full API client using xAuth.
pub struct InstapaperClient {
    client: Client,
    config: InstapaperConfig,
    signer: Option<OAuth1Signer>,
}

impl InstapaperClient {
    pub fn new(config: InstapaperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            config,
            signer: None,
        })
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            suffix
        )
    }

    pub fn is_authorized(&self) -> bool {
        self.signer
            .as_ref()
            .is_some_and(|s| s.credentials().token.is_some())
    }

    fn auth_error(message: impl Into<String>) -> ThoughtError {
        ThoughtError::AuthorizationError {
            service: SERVICE.to_string(),
            message: message.into(),
        }
    }

    /// Exchanges username and password for an access token. Must succeed
    /// before any data call.
    pub async fn authorize(&mut self) -> Result<()> {
        let consumer_key = validate_required_field("instapaper.consumer_key", &self.config.consumer_key)?;
        let consumer_secret =
            validate_required_field("instapaper.consumer_secret", &self.config.consumer_secret)?;
        let username = validate_required_field("instapaper.username", &self.config.username)?;
        let password = self.config.password.clone().unwrap_or_default();

        let consumer = OAuth1Signer::new(OAuth1Credentials::consumer(
            consumer_key,
            consumer_secret,
        ));
        let url = self.url(ENDPOINT_AUTH);
        let params = vec![
            ("x_auth_username".to_string(), username.to_string()),
            ("x_auth_password".to_string(), password),
            ("x_auth_mode".to_string(), AUTH_MODE.to_string()),
        ];
        let authorization = consumer.authorization("POST", &url, &params)?;

        tracing::debug!("📡 POST {}", url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Self::auth_error(format!(
                "{} returned {}: {}",
                url,
                status,
                body.trim()
            )));
        }

        let mut token = None;
        let mut token_secret = None;
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "oauth_token" => token = Some(value.into_owned()),
                "oauth_token_secret" => token_secret = Some(value.into_owned()),
                _ => {}
            }
        }

        match (token, token_secret) {
            (Some(token), Some(secret)) if !token.is_empty() && !secret.is_empty() => {
                self.signer = Some(OAuth1Signer::new(
                    consumer.credentials().clone().with_token(token, secret),
                ));
                tracing::info!("🔑 Authorized with {}", SERVICE);
                Ok(())
            }
            _ => Err(Self::auth_error("Not properly authorized, try again")),
        }
    }

    async fn signed_post(&self, suffix: &str, params: Vec<(String, String)>) -> Result<Value> {
        let signer = self
            .signer
            .as_ref()
            .filter(|s| s.credentials().token.is_some())
            .ok_or_else(|| Self::auth_error("authorize() must succeed before fetching data"))?;

        let url = self.url(suffix);
        let authorization = signer.authorization("POST", &url, &params)?;

        tracing::debug!("📡 POST {}", url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ThoughtError::HttpStatusError {
                method: "POST".to_string(),
                endpoint: url,
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// Lists the bookmarks of a folder (`unread`, `starred`, `archive` or a folder id).
    pub async fn bookmarks(&self, folder: &str) -> Result<Table> {
        let params = vec![
            ("folder_id".to_string(), folder.to_string()),
            ("limit".to_string(), self.config.limit.to_string()),
        ];
        let response = self.signed_post(ENDPOINT_ALL_BOOKMARKS, params).await?;
        let table = bookmarks_from_response(response)?;
        tracing::info!("📥 Fetched {} bookmarks from folder '{}'", table.len(), folder);
        Ok(table)
    }
}

fn is_account_entry(entry: &serde_json::Map<String, Value>) -> bool {
    let keys: BTreeSet<&str> = entry.keys().map(String::as_str).collect();
    let same_keys = |expected: &[&str]| keys == expected.iter().copied().collect::<BTreeSet<_>>();
    same_keys(METADATA_KEYS) || same_keys(ACCOUNT_KEYS)
}

/// Keeps the bookmark entries of a `bookmarks/list` response.
pub fn bookmarks_from_response(response: Value) -> Result<Table> {
    let entries = match response {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("bookmarks") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(ThoughtError::ProcessingError {
                    message: "bookmarks response has no bookmark list".to_string(),
                })
            }
        },
        other => {
            return Err(ThoughtError::ProcessingError {
                message: format!("unexpected bookmarks response: {}", other),
            })
        }
    };

    let records = entries.into_iter().filter_map(|entry| match entry {
        Value::Object(map) if !is_account_entry(&map) => Some(Record::new(map)),
        _ => None,
    });
    Ok(Table::from_records(records))
}
