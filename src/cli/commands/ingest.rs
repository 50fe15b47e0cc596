//! Ingest command: run the ingestion pipeline only.

use super::require;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::ingest::Ingestor;
use anyhow::Result;
use std::path::Path;

/// Chunk, embed and store one document.
pub async fn run_ingest(path: &Path, replace: bool, collection: Option<String>, settings: Settings) -> Result<()> {
    require(Operation::Ingest, &settings)?;

    let mut ingestor = Ingestor::from_settings(&settings)?;
    if let Some(name) = &collection {
        ingestor = ingestor.with_collection(name);
    }

    let spinner = Output::spinner(&format!("Ingesting {}...", path.display()));
    let outcome = ingestor.ingest(path, replace).await;
    spinner.finish_and_clear();

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    };

    if report.duplicate {
        Output::warning(&format!(
            "{} was already stored in '{}'; its chunks were appended again. Use --replace to avoid duplicates.",
            report.source,
            ingestor.collection()
        ));
    }

    Output::success(&format!("Ingested {}", report.source));
    Output::kv("Collection", ingestor.collection());
    Output::kv("Pages", &report.pages.to_string());
    Output::kv("Chunks", &report.chunks.to_string());
    Output::kv("Records stored", &report.records.to_string());
    if report.replaced > 0 {
        Output::kv("Records replaced", &report.replaced.to_string());
    }
    Output::kv("Database", &settings.sqlite_path().display().to_string());

    Ok(())
}
