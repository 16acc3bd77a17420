//! Cursor-following reads against the workspace.

use crate::domain::model::QueryPage;
use crate::domain::ports::Workspace;
use crate::utils::error::{Result, ThoughtError};
use serde_json::Value;
use std::future::Future;

/// Calls `fetch` with the continuation cursor until a page reports no more
/// results, returning every result in page order.
pub async fn paginate<F, Fut>(mut fetch: F) -> Result<Vec<Value>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<QueryPage>>,
{
    let mut results = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(cursor.take()).await?;
        pages += 1;
        tracing::debug!(
            "Fetched page {} with {} result(s), has_more={}",
            pages,
            page.results.len(),
            page.has_more
        );
        results.extend(page.results);

        if !page.has_more {
            break;
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => {
                return Err(ThoughtError::ProcessingError {
                    message: format!(
                        "page {} reported more results without a continuation cursor",
                        pages
                    ),
                })
            }
        }
    }

    Ok(results)
}

pub async fn query_all<W>(
    workspace: &W,
    database_id: &str,
    filter: Option<&Value>,
) -> Result<Vec<Value>>
where
    W: Workspace + ?Sized,
{
    let pages = paginate(|cursor| async move {
        workspace
            .query_database(database_id, filter, cursor.as_deref())
            .await
    })
    .await?;
    tracing::info!("📥 Fetched {} page(s) from database {}", pages.len(), database_id);
    Ok(pages)
}

pub async fn list_all_children<W>(workspace: &W, block_id: &str) -> Result<Vec<Value>>
where
    W: Workspace + ?Sized,
{
    paginate(|cursor| async move {
        workspace
            .list_block_children(block_id, cursor.as_deref())
            .await
    })
    .await
}
