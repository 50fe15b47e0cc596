//! Embedding generation for semantic search and retrieval.

mod hashing;
mod local;
mod openai;

pub use hashing::HashingEmbedder;
pub use local::{LocalEmbedder, LOCAL_DIMENSIONS};
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, Settings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder selected in settings.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    match settings.embedding.provider {
        EmbeddingProvider::Local => Ok(Arc::new(LocalEmbedder::from_settings(settings))),
        EmbeddingProvider::Openai => Ok(Arc::new(OpenAIEmbedder::from_settings(settings)?)),
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(
            settings.embedding.dimensions as usize,
        ))),
    }
}
