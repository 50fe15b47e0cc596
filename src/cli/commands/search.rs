//! Search command implementation.

use super::require;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::create_embedder;
use crate::rag::ContextBuilder;
use crate::vector_store::SqliteVectorStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    min_score: f32,
    collection: Option<String>,
    settings: Settings,
) -> Result<()> {
    require(Operation::Search, &settings)?;

    let store = Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?);
    let embedder = create_embedder(&settings)?;
    let collection = collection.unwrap_or_else(|| settings.vector_store.collection.clone());

    let context_builder = ContextBuilder::new(store, embedder, &collection)
        .with_max_chunks(limit)
        .with_min_score(min_score);

    let spinner = Output::spinner("Searching...");
    let results = context_builder.build(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(chunks) => {
            if chunks.is_empty() {
                Output::warning(&format!("No results found in '{}' matching your query.", collection));
            } else {
                Output::success(&format!("Found {} results in '{}'", chunks.len(), collection));
                for chunk in &chunks {
                    Output::search_result(chunk);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
