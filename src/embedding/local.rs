//! Local embeddings with fastembed.
//!
//! Runs all-MiniLM-L6-v2 on the CPU. The model is downloaded into the data
//! directory on first use and loaded lazily, so building the embedder is cheap.

use super::Embedder;
use crate::config::Settings;
use crate::error::{ColloquyError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Output size of all-MiniLM-L6-v2.
pub const LOCAL_DIMENSIONS: usize = 384;

/// Sentence-transformer embedder running in process.
pub struct LocalEmbedder {
    model: Arc<Mutex<Option<TextEmbedding>>>,
    cache_dir: PathBuf,
}

impl LocalEmbedder {
    /// Create an embedder that keeps model files under `cache_dir`.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            model: Arc::new(Mutex::new(None)),
            cache_dir,
        }
    }

    /// Create from settings. Model files live in `<data_dir>/models`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.data_dir().join("models"))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

fn load_model(cache_dir: &Path) -> Result<TextEmbedding> {
    info!("Loading all-MiniLM-L6-v2 from {}", cache_dir.display());
    let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
        .with_cache_dir(cache_dir.to_path_buf())
        .with_show_download_progress(false);
    TextEmbedding::try_new(options)
        .map_err(|e| ColloquyError::Embedding(format!("Failed to load local embedding model: {}", e)))
}

fn embed_blocking(
    model: &Mutex<Option<TextEmbedding>>,
    cache_dir: &Path,
    texts: Vec<String>,
) -> Result<Vec<Vec<f32>>> {
    let mut guard = model
        .lock()
        .map_err(|_| ColloquyError::Embedding("Local embedding model lock poisoned".to_string()))?;
    if guard.is_none() {
        *guard = Some(load_model(cache_dir)?);
    }
    let model = guard
        .as_mut()
        .ok_or_else(|| ColloquyError::Embedding("Local embedding model not loaded".to_string()))?;

    model
        .embed(texts, None)
        .map_err(|e| ColloquyError::Embedding(format!("Local embedding failed: {}", e)))
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ColloquyError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!("Embedding {} texts locally", texts.len());

        let model = Arc::clone(&self.model);
        let cache_dir = self.cache_dir.clone();
        let batch = texts.to_vec();
        let embeddings = tokio::task::spawn_blocking(move || embed_blocking(&model, &cache_dir, batch))
            .await
            .map_err(|e| ColloquyError::Embedding(format!("Embedding task failed: {}", e)))??;

        if embeddings.len() != texts.len() {
            return Err(ColloquyError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        LOCAL_DIMENSIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_files_live_under_data_dir() {
        let mut settings = Settings::default();
        settings.general.data_dir = "/tmp/colloquy-data".to_string();
        let embedder = LocalEmbedder::from_settings(&settings);
        assert_eq!(embedder.cache_dir(), Path::new("/tmp/colloquy-data/models"));
        assert_eq!(embedder.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_empty_batch_does_not_load_model() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = LocalEmbedder::new(dir.path().to_path_buf());
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
        assert!(embedder.model.lock().unwrap().is_none());
    }
}
