pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod services;
pub mod utils;

pub use adapters::notion::{parse_notion_id, NotionClient};
pub use adapters::storage::LocalStorage;
pub use config::AppConfig;
pub use core::etl::EtlEngine;
pub use domain::model::{Record, RunMetadata, Table};
pub use services::Registry;
pub use utils::error::{Result, ThoughtError};
