//! Context building for RAG responses.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::debug;

/// Builds context from search results for RAG.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    max_chunks: usize,
    min_score: f32,
}

impl ContextBuilder {
    /// Create a context builder over one collection.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, collection: &str) -> Self {
        Self {
            vector_store,
            embedder,
            collection: collection.to_string(),
            max_chunks: 3,
            min_score: 0.0,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Retrieve the chunks nearest to `query`.
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self
            .vector_store
            .search(&self.collection, &query_embedding, self.max_chunks, self.min_score)
            .await?;
        debug!("Retrieved {} chunks from '{}'", results.len(), self.collection);

        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Format context chunks for the system prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    if chunks.is_empty() {
        return "(No relevant passages were found in the document.)".to_string();
    }
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("---\n[{}] {}\n{}\n---", i + 1, chunk.label, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format context chunks for display to the user.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("{} (score: {:.2})", chunk.label, chunk.score))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(label: &str, content: &str) -> ContextChunk {
        ContextChunk {
            source: "/tmp/a.pdf".to_string(),
            page: Some(1),
            label: label.to_string(),
            content: content.to_string(),
            score: 0.5,
        }
    }

    #[test]
    fn test_prompt_context_is_numbered() {
        let text = format_context_for_prompt(&[chunk("a.pdf p.1", "first"), chunk("a.pdf p.2", "second")]);
        assert!(text.starts_with("---\n[1] a.pdf p.1\nfirst"));
        assert!(text.contains("[2] a.pdf p.2\nsecond"));
    }

    #[test]
    fn test_empty_context_says_so() {
        assert!(format_context_for_prompt(&[]).contains("No relevant passages"));
        assert_eq!(format_context_for_display(&[chunk("a.pdf p.3", "x")]), "a.pdf p.3 (score: 0.50)");
    }
}
