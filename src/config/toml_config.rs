use crate::utils::error::{Result, ThoughtError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

/// Process-wide settings, built once in `main` and handed to each command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub instapaper: InstapaperConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    pub token: Option<String>,
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
    #[serde(default = "default_notion_version")]
    pub version: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstapaperConfig {
    #[serde(default = "default_instapaper_base_url")]
    pub base_url: String,
    #[serde(default = "default_instapaper_api_version")]
    pub api_version: String,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_bookmarks_folder")]
    pub default_folder: String,
    #[serde(default = "default_bookmarks_limit")]
    pub limit: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Page whose child databases receive synced data.
    pub services_page: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_notion_base_url() -> String {
    "https://api.notion.com/v1".to_string()
}
fn default_notion_version() -> String {
    "2022-06-28".to_string()
}
fn default_page_size() -> u32 {
    100
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_instapaper_base_url() -> String {
    "https://www.instapaper.com/api".to_string()
}
fn default_instapaper_api_version() -> String {
    "1".to_string()
}
fn default_bookmarks_folder() -> String {
    "archive".to_string()
}
fn default_bookmarks_limit() -> u32 {
    500
}
fn default_output_dir() -> String {
    "./exports".to_string()
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_notion_base_url(),
            version: default_notion_version(),
            page_size: default_page_size(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for InstapaperConfig {
    fn default() -> Self {
        Self {
            base_url: default_instapaper_base_url(),
            api_version: default_instapaper_api_version(),
            consumer_key: None,
            consumer_secret: None,
            username: None,
            password: None,
            default_folder: default_bookmarks_folder(),
            limit: default_bookmarks_limit(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl AppConfig {
    /// Reads the optional config file, then lets the environment override it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            Some(path) => {
                tracing::debug!("No configuration file at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ThoughtError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ThoughtError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        ENV_REFERENCE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// Overlays values from environment-style variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut Option<String>, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = Some(value);
            }
        };
        set(&mut self.notion.token, "NOTION_ACCESS_TOKEN");
        set(&mut self.sync.services_page, "NOTION_SERVICES_PAGE");
        set(&mut self.instapaper.consumer_key, "INSTAPAPER_CONSUMER_ID");
        set(&mut self.instapaper.consumer_secret, "INSTAPAPER_CONSUMER_SECRET");
        set(&mut self.instapaper.username, "INSTAPAPER_USER");
        set(&mut self.instapaper.password, "INSTAPAPER_PASS");

        if let Some(url) = lookup("NOTION_BASE_URL").filter(|v| !v.is_empty()) {
            self.notion.base_url = url;
        }
        if let Some(url) = lookup("INSTAPAPER_BASE_URL").filter(|v| !v.is_empty()) {
            self.instapaper.base_url = url;
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("notion.base_url", &self.notion.base_url)?;
        validation::validate_url("instapaper.base_url", &self.instapaper.base_url)?;
        validation::validate_api_version("notion.version", &self.notion.version)?;
        validation::validate_range("notion.page_size", self.notion.page_size, 1, 100)?;
        validation::validate_range("notion.timeout_seconds", self.notion.timeout_seconds, 1, 600)?;
        validation::validate_range("instapaper.limit", self.instapaper.limit, 1, 500)?;
        validation::validate_range(
            "instapaper.timeout_seconds",
            self.instapaper.timeout_seconds,
            1,
            600,
        )?;
        validation::validate_non_empty_string(
            "instapaper.default_folder",
            &self.instapaper.default_folder,
        )?;
        validation::validate_path("export.output_dir", &self.export.output_dir)?;
        Ok(())
    }
}
