//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let store = SqliteVectorStore::new(&settings.sqlite_path())?;

    let collections = match store.collections().await {
        Ok(collections) => collections,
        Err(e) => {
            Output::error(&format!("Failed to list collections: {}", e));
            return Err(e.into());
        }
    };

    if collections.is_empty() {
        Output::info("Nothing stored yet. Use 'colloquy ingest <pdf>' to add a document.");
        return Ok(());
    }

    Output::header(&format!("Collections ({})", collections.len()));
    for collection in &collections {
        println!();
        Output::list_item(&format!(
            "{} ({} records, {} documents)",
            collection.name, collection.record_count, collection.source_count
        ));
        for source in store.sources(&collection.name).await? {
            Output::source_info(
                &source.source,
                source.record_count,
                &source.indexed_at.format("%Y-%m-%d %H:%M").to_string(),
            );
        }
    }

    let total: usize = collections.iter().map(|c| c.record_count).sum();
    println!();
    Output::kv("Total records", &total.to_string());
    Output::kv("Database", &settings.sqlite_path().display().to_string());

    Ok(())
}
