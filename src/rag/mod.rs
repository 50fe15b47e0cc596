//! RAG (Retrieval-Augmented Generation) for question answering over ingested documents.

pub mod context;
mod response;

pub use context::ContextBuilder;
pub use response::{RagEngine, RagResponse};

use crate::vector_store::SearchResult;

/// A retrieved chunk prepared for prompting and display.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Source document identifier.
    pub source: String,
    /// Page the chunk starts on.
    pub page: Option<u32>,
    /// Display label, e.g. `resume.pdf p.2`.
    pub label: String,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            label: result.record.label(),
            source: result.record.source,
            page: result.record.page,
            content: result.record.content,
            score: result.score,
        }
    }
}
