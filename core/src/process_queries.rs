//! Batch execution of many queries against one engine.

use crate::error::Result;
use crate::index::{Document, DocumentStatus, ExecutionPolicy};
use crate::server::SearchServer;
use rayon::prelude::*;

/// Runs every query concurrently with the default predicate; `results[i]`
/// belongs to `queries[i]`. The first malformed query fails the batch.
pub fn process_queries<Q>(server: &SearchServer, queries: &[Q]) -> Result<Vec<Vec<Document>>>
where
    Q: AsRef<str> + Sync,
{
    queries
        .par_iter()
        .map(|query| {
            server.find_top_documents_with_status(
                ExecutionPolicy::Parallel,
                query.as_ref(),
                DocumentStatus::Active,
            )
        })
        .collect()
}

/// Like [`process_queries`], flattened: all hits of query 0, then query 1, ...
pub fn process_queries_joined<Q>(server: &SearchServer, queries: &[Q]) -> Result<Vec<Document>>
where
    Q: AsRef<str> + Sync,
{
    Ok(process_queries(server, queries)?
        .into_iter()
        .flatten()
        .collect())
}
