use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::{json, Value};
use tempfile::TempDir;
use thought::app::pipelines::{
    destination_name, resolve_destination, DedupeOptions, DedupePipeline, ExportOptions,
    ExportPipeline, SyncPipeline,
};
use thought::config::{InstapaperConfig, NotionConfig};
use thought::core::output::ExportFormat;
use thought::core::source::query_all;
use thought::services::ActionArgs;
use thought::{AppConfig, EtlEngine, LocalStorage, NotionClient, Registry, ThoughtError};

fn notion_config(base_url: String) -> NotionConfig {
    NotionConfig {
        token: Some("secret-token".to_string()),
        base_url,
        ..NotionConfig::default()
    }
}

fn page(id: &str, name: &str, status: &str) -> Value {
    json!({
        "object": "page",
        "id": id,
        "properties": {
            "Name": {"id": "title", "type": "title", "title": [
                {"type": "text", "text": {"content": name}, "plain_text": name}
            ]},
            "Status": {"id": "s", "type": "select", "select": {"id": "o", "name": status, "color": "red"}}
        }
    })
}

/// Serves `pages` from `databases/db1/query` as three cursor-linked pages.
fn mock_three_pages(server: &MockServer, pages: [Vec<Value>; 3]) -> Vec<httpmock::Mock<'_>> {
    let [first, second, third] = pages;
    vec![
        server.mock(|when, then| {
            when.method(POST)
                .path("/databases/db1/query")
                .json_body(json!({"page_size": 100}));
            then.status(200).json_body(json!({
                "object": "list", "results": first, "has_more": true, "next_cursor": "c1"
            }));
        }),
        server.mock(|when, then| {
            when.method(POST)
                .path("/databases/db1/query")
                .json_body(json!({"page_size": 100, "start_cursor": "c1"}));
            then.status(200).json_body(json!({
                "object": "list", "results": second, "has_more": true, "next_cursor": "c2"
            }));
        }),
        server.mock(|when, then| {
            when.method(POST)
                .path("/databases/db1/query")
                .json_body(json!({"page_size": 100, "start_cursor": "c2"}));
            then.status(200).json_body(json!({
                "object": "list", "results": third, "has_more": false, "next_cursor": null
            }));
        }),
    ]
}

#[tokio::test]
async fn test_pagination_accumulates_all_pages_in_order() -> anyhow::Result<()> {
    let server = MockServer::start();
    let mocks = mock_three_pages(
        &server,
        [
            vec![json!({"id": "a"}), json!({"id": "b"})],
            vec![json!({"id": "c"}), json!({"id": "d"})],
            vec![json!({"id": "e"})],
        ],
    );

    let client = NotionClient::new(&notion_config(server.base_url()))?;
    let results = query_all(&client, "db1", None).await?;

    for mock in &mocks {
        mock.assert();
    }
    let ids: Vec<&str> = results.iter().filter_map(|r| r["id"].as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_csv_export() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let mocks = mock_three_pages(
        &server,
        [
            vec![page("p1", "Rust book", "Done")],
            vec![page("p2", "Zig notes", "Reading")],
            vec![page("p3", "Go tour", "Done")],
        ],
    );

    let mut options = ExportOptions::new("db1", ExportFormat::Csv);
    options.clean_columns = true;
    options.plain_text = true;
    options.columns = vec!["Name".to_string(), "Status".to_string()];

    let client = NotionClient::new(&notion_config(server.base_url()))?;
    let pipeline = ExportPipeline::new(client, LocalStorage::new(output_path.clone()), options);
    let written = EtlEngine::new("export", pipeline).run().await?;

    for mock in &mocks {
        mock.assert();
    }
    assert!(written.starts_with(&output_path));
    assert!(written.ends_with(".csv"));
    let file_name = std::path::Path::new(&written)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap();
    assert!(file_name.starts_with("db1_"));

    let content = std::fs::read_to_string(&written)?;
    assert_eq!(
        content,
        "Name,Status\nRust book,Done\nZig notes,Reading\nGo tour,Done\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_json_export_writes_array_of_rows() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/databases/db1/query");
        then.status(200).json_body(json!({
            "results": [page("p1", "Rust book", "Done")], "has_more": false
        }));
    });

    let client = NotionClient::new(&notion_config(server.base_url()))?;
    let pipeline = ExportPipeline::new(
        client,
        LocalStorage::new(temp_dir.path().to_str().unwrap().to_string()),
        ExportOptions::new("db1", ExportFormat::Json),
    );
    let written = EtlEngine::new("export", pipeline).run().await?;

    let rows: Value = serde_json::from_str(&std::fs::read_to_string(&written)?)?;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["id"], json!("p1"));
    assert_eq!(rows[0]["properties.Status.select.name"], json!("Done"));
    Ok(())
}

#[tokio::test]
async fn test_dedupe_archives_later_duplicates() -> anyhow::Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/databases/db1/query");
        then.status(200).json_body(json!({
            "results": [
                page("p1", "Rust book", "Done"),
                page("p2", "Rust book", "Done"),
                page("p3", "Go tour", "Done")
            ],
            "has_more": false
        }));
    });
    let archive = server.mock(|when, then| {
        when.method(PATCH)
            .path("/pages/p2")
            .json_body(json!({"archived": true}));
        then.status(200).json_body(json!({"object": "page", "id": "p2", "archived": true}));
    });
    let wrong = server.mock(|when, then| {
        when.method(PATCH).path("/pages/p1");
        then.status(200).json_body(json!({}));
    });

    let client = NotionClient::new(&notion_config(server.base_url()))?;
    let pipeline: DedupePipeline<_, LocalStorage> =
        DedupePipeline::new(client, DedupeOptions::new("db1"));
    let summary = EtlEngine::new("dedupe", pipeline).run().await?;

    archive.assert();
    wrong.assert_hits(0);
    assert_eq!(summary, "archived 1 duplicate(s), 2 row(s) kept");
    Ok(())
}

#[tokio::test]
async fn test_sync_fails_when_destination_is_missing() -> anyhow::Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/blocks/target/children")
            .query_param("page_size", "100");
        then.status(200).json_body(json!({
            "results": [
                {"object": "block", "id": "x", "type": "child_database", "child_database": {"title": "pocket_items"}}
            ],
            "has_more": false
        }));
    });

    let client = NotionClient::new(&notion_config(server.base_url()))?;
    let err = resolve_destination(&client, "target", "instapaper_bookmarks")
        .await
        .unwrap_err();

    assert!(matches!(err, ThoughtError::DestinationMissing { ref name } if name == "instapaper_bookmarks"));
    assert_eq!(err.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn test_sync_instapaper_bookmarks_into_workspace() -> anyhow::Result<()> {
    let server = MockServer::start();
    let auth = server.mock(|when, then| {
        when.method(POST).path("/1/oauth/access_token");
        then.status(200).body("oauth_token=tok&oauth_token_secret=sec");
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/1/bookmarks/list")
            .body_contains("folder_id=starred");
        then.status(200).json_body(json!([
            {"type": "meta"},
            {"type": "user", "user_id": 1, "username": "me", "subscription_is_active": "1"},
            {"type": "bookmark", "bookmark_id": 10, "title": "One", "url": "https://a", "starred": "1"}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/blocks/target/children");
        then.status(200).json_body(json!({
            "results": [
                {"object": "block", "id": "dest", "type": "child_database", "child_database": {"title": "instapaper_bookmarks"}}
            ],
            "has_more": false
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/databases/dest");
        then.status(200).json_body(json!({
            "object": "database",
            "id": "dest",
            "properties": {
                "Title": {"id": "title", "type": "title", "title": {}},
                "URL": {"id": "u", "type": "url", "url": {}},
                "Starred": {"id": "s", "type": "checkbox", "checkbox": {}}
            }
        }));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/pages").json_body(json!({
            "parent": {"database_id": "dest"},
            "properties": {
                "Title": {"title": [{"type": "text", "text": {"content": "One"}}]},
                "URL": {"url": "https://a"},
                "Starred": {"checkbox": true}
            }
        }));
        then.status(200).json_body(json!({"object": "page", "id": "new"}));
    });

    let config = AppConfig {
        notion: notion_config(server.base_url()),
        instapaper: InstapaperConfig {
            base_url: server.base_url(),
            consumer_key: Some("ck".to_string()),
            consumer_secret: Some("cs".to_string()),
            username: Some("me".to_string()),
            ..InstapaperConfig::default()
        },
        ..AppConfig::default()
    };

    let mut service = Registry::new().create("instapaper", &config)?;
    service.authorize().await?;
    auth.assert();

    let client = NotionClient::new(&config.notion)?;
    let destination =
        resolve_destination(&client, "target", &destination_name(service.name(), "bookmarks"))
            .await?;
    let pipeline = SyncPipeline::new(
        client,
        service,
        "bookmarks",
        ActionArgs::new().with("folder", "starred"),
        destination,
    );
    let summary = EtlEngine::new("sync", pipeline).run().await?;

    create.assert();
    assert_eq!(summary, "created 1 page(s) in 'instapaper_bookmarks'");
    Ok(())
}

#[test]
fn test_unknown_service_is_named_error() {
    let err = Registry::new()
        .create("pocket", &AppConfig::default())
        .err()
        .unwrap();
    match err {
        ThoughtError::ServiceNotRegistered { service, available } => {
            assert_eq!(service, "pocket");
            assert_eq!(available, vec!["instapaper".to_string()]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
