//! Vector store abstraction for Colloquy.
//!
//! Records are grouped into named collections. Search is a brute-force cosine
//! scan; results with equal scores keep insertion order.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::Chunk;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// One embedded chunk stored in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique record ID.
    pub id: Uuid,
    /// Collection this record belongs to.
    pub collection: String,
    /// Source document identifier.
    pub source: String,
    /// 1-based page the chunk starts on.
    pub page: Option<u32>,
    /// Order of the chunk within its source.
    pub chunk_order: i64,
    /// Text content of the chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this record was written.
    pub indexed_at: DateTime<Utc>,
}

impl Record {
    /// Create a record for a chunk.
    pub fn new(collection: &str, chunk: &Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection: collection.to_string(),
            source: chunk.source.clone(),
            page: chunk.page,
            chunk_order: chunk.order as i64,
            content: chunk.text.clone(),
            embedding,
            indexed_at: Utc::now(),
        }
    }

    /// Short label for display, e.g. `resume.pdf p.2`.
    pub fn label(&self) -> String {
        let name = std::path::Path::new(&self.source)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.clone());
        match self.page {
            Some(page) => format!("{} p.{}", name, page),
            None => name,
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched record.
    pub record: Record,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub name: String,
    pub record_count: usize,
    pub source_count: usize,
}

/// Summary of one source within a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub collection: String,
    pub source: String,
    pub record_count: usize,
    /// Most recent write for this source.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append records. Existing records are never replaced.
    async fn append(&self, records: &[Record]) -> Result<usize>;

    /// Top `limit` records in `collection` by cosine similarity.
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// List all collections.
    async fn collections(&self) -> Result<Vec<CollectionSummary>>;

    /// List the sources stored in a collection.
    async fn sources(&self, collection: &str) -> Result<Vec<SourceSummary>>;

    /// Number of records in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Whether a collection holds any record from `source`.
    async fn has_source(&self, collection: &str, source: &str) -> Result<bool>;

    /// Delete every record of `source` in `collection`.
    async fn delete_source(&self, collection: &str, source: &str) -> Result<usize>;

    /// Swap the records of `source` in `collection` for `records` in one
    /// atomic step. On error the stored records are left untouched.
    ///
    /// Returns `(deleted, inserted)`.
    async fn replace_source(
        &self,
        collection: &str,
        source: &str,
        records: &[Record],
    ) -> Result<(usize, usize)>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score records (given in insertion order) and keep the best `limit`.
///
/// Records whose dimension differs from the query are skipped.
pub(crate) fn rank(
    records: impl IntoIterator<Item = Record>,
    query_embedding: &[f32],
    limit: usize,
    min_score: f32,
) -> Vec<SearchResult> {
    let mut skipped = 0usize;
    let mut results: Vec<SearchResult> = records
        .into_iter()
        .filter(|record| {
            let matches = record.embedding.len() == query_embedding.len();
            if !matches {
                skipped += 1;
            }
            matches
        })
        .map(|record| {
            let score = cosine_similarity(query_embedding, &record.embedding);
            SearchResult { record, score }
        })
        .filter(|r| r.score >= min_score)
        .collect();

    if skipped > 0 {
        warn!(
            "Skipped {} record(s) with a different embedding dimension than the query ({})",
            skipped,
            query_embedding.len()
        );
    }

    // Stable sort keeps insertion order for equal scores.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}
