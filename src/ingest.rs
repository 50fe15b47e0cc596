//! Ingestion pipeline: load, split, embed, store.

use crate::chunking::{Chunk, RecursiveSplitter};
use crate::config::Settings;
use crate::document::{self, LoadedDocument};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{ColloquyError, Result};
use crate::vector_store::{Record, SqliteVectorStore, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of ingesting one document.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// Source identifier the records were stored under.
    pub source: String,
    /// Pages read from the document.
    pub pages: usize,
    /// Non-blank chunks produced by the splitter.
    pub chunks: usize,
    /// Records appended to the store.
    pub records: usize,
    /// Records already present for this source before ingestion.
    pub duplicate: bool,
    /// Records swapped out because `replace` was set.
    pub replaced: usize,
}

/// Runs documents through the ingestion pipeline into one collection.
pub struct Ingestor {
    splitter: RecursiveSplitter,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl Ingestor {
    pub fn new(
        splitter: RecursiveSplitter,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: &str,
    ) -> Self {
        Self {
            splitter,
            embedder,
            store,
            collection: collection.to_string(),
        }
    }

    /// Build the splitter, embedder and SQLite store from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let splitter = RecursiveSplitter::from_settings(&settings.chunking)?;
        let embedder = create_embedder(settings)?;
        let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?);
        Ok(Self::new(
            splitter,
            embedder,
            store,
            &settings.vector_store.collection,
        ))
    }

    /// Use a different collection.
    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    /// Load a file from disk and ingest it.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest(&self, path: &Path, replace: bool) -> Result<IngestReport> {
        let document = document::load(path)?;
        self.ingest_document(&document, replace).await
    }

    /// Ingest an already loaded document.
    ///
    /// The document is fully split and embedded before anything is written.
    #[instrument(skip(self, document), fields(source = %document.source))]
    pub async fn ingest_document(&self, document: &LoadedDocument, replace: bool) -> Result<IngestReport> {
        if document.is_blank() {
            return Err(ColloquyError::EmptyDocument(document.source.clone()));
        }

        let chunks: Vec<Chunk> = self
            .splitter
            .split_document(document)
            .into_iter()
            .filter(|c| !c.is_blank())
            .collect();
        info!(
            "Split {} into {} chunks (size {}, overlap {})",
            document.source,
            chunks.len(),
            self.splitter.chunk_size(),
            self.splitter.chunk_overlap()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(ColloquyError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let records: Vec<Record> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Record::new(&self.collection, chunk, embedding))
            .collect();

        let duplicate = self.store.has_source(&self.collection, &document.source).await?;
        let (replaced, appended) = if duplicate && replace {
            let (replaced, appended) = self
                .store
                .replace_source(&self.collection, &document.source, &records)
                .await?;
            info!("Replaced {} existing records for {}", replaced, document.source);
            (replaced, appended)
        } else {
            if duplicate {
                warn!(
                    "{} is already in collection '{}'; appending another copy",
                    document.source, self.collection
                );
            }
            (0, self.store.append(&records).await?)
        };

        Ok(IngestReport {
            source: document.source.clone(),
            pages: document.pages.len(),
            chunks: chunks.len(),
            records: appended,
            duplicate,
            replaced,
        })
    }
}
